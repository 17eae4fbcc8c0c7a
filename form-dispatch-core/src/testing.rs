//! Test utilities for form-dispatch applications
//!
//! - [`IntentRecorder`]: middleware stage that records every intent it sees
//! - [`ScriptedTransport`]: [`Transport`] double answering from a script
//! - [`settle`]: drive a store until no queued intent arrives for a while
//! - Assertion macros for verifying dispatched intents
//!
//! # Example
//!
//! ```ignore
//! use form_dispatch::testing::{settle, IntentRecorder, ScriptedTransport};
//!
//! let recorder = IntentRecorder::new();
//! let transport = ScriptedTransport::new().fail(TransportError::Unauthorized("nope".into()));
//!
//! let mut store = build_store(Arc::new(transport.clone()), recorder.clone());
//! store.dispatch(Intent::FormSubmit)?;
//! settle(&mut store, Duration::from_secs(1)).await;
//!
//! let intents = recorder.intents();
//! assert_dispatched!(intents, Intent::SubmitDidFail(_));
//! assert_eq!(transport.calls(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::DispatchError;
use crate::middleware::{Middleware, Next};
use crate::store::Store;
use crate::transport::{Session, Transport, TransportError};
use crate::validation::FieldValues;
use crate::Intent;

/// Middleware that records intents in the order it observes them.
///
/// Clones share the same record, so keep one to inspect after handing the
/// other to the store.
#[derive(Debug)]
pub struct IntentRecorder<I> {
    seen: Arc<Mutex<Vec<I>>>,
}

impl<I> Clone for IntentRecorder<I> {
    fn clone(&self) -> Self {
        Self {
            seen: self.seen.clone(),
        }
    }
}

impl<I> Default for IntentRecorder<I> {
    fn default() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<I: Intent> IntentRecorder<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn intents(&self) -> Vec<I> {
        self.seen.lock().clone()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<I> {
        std::mem::take(&mut *self.seen.lock())
    }

    /// Kinds of the recorded intents
    pub fn kinds(&self) -> Vec<&'static str> {
        self.seen.lock().iter().map(Intent::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.seen.lock().iter().filter(|i| i.kind() == kind).count()
    }
}

impl<S: Clone, I: Intent> Middleware<S, I> for IntentRecorder<I> {
    fn name(&self) -> &'static str {
        "intent-recorder"
    }

    fn intercept(&mut self, intent: I, next: &mut Next<'_, S, I>) -> Result<bool, DispatchError> {
        self.seen.lock().push(intent.clone());
        next.run(intent)
    }
}

struct Scripted {
    delay: Duration,
    outcome: Result<Session, TransportError>,
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Scripted>,
    submitted: Vec<FieldValues>,
}

/// [`Transport`] double answering submissions from a script.
///
/// Responses are consumed in order; once the script runs out every
/// submission fails with a network error. Clones share the script.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next submission with `session`
    pub fn succeed(self, session: Session) -> Self {
        self.respond(Duration::ZERO, Ok(session))
    }

    /// Answer the next submission with `error`
    pub fn fail(self, error: TransportError) -> Self {
        self.respond(Duration::ZERO, Err(error))
    }

    /// Answer the next submission with `outcome` after `delay`
    pub fn respond(self, delay: Duration, outcome: Result<Session, TransportError>) -> Self {
        self.script
            .lock()
            .responses
            .push_back(Scripted { delay, outcome });
        self
    }

    /// Number of submissions received
    pub fn calls(&self) -> usize {
        self.script.lock().submitted.len()
    }

    /// Values of every submission, in arrival order
    pub fn submitted(&self) -> Vec<FieldValues> {
        self.script.lock().submitted.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit_credentials(&self, values: FieldValues) -> Result<Session, TransportError> {
        let next = {
            let mut script = self.script.lock();
            script.submitted.push(values);
            script.responses.pop_front()
        };
        let Some(Scripted { delay, outcome }) = next else {
            return Err(TransportError::Network("no scripted response left".into()));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

/// Process queued intents until none arrives within `idle`.
///
/// Returns how many intents were processed. With a paused Tokio clock this
/// runs every pending effect to completion without real waiting.
pub async fn settle<S, I>(store: &mut Store<S, I>, idle: Duration) -> usize
where
    S: Clone + Send + Sync + 'static,
    I: Intent,
{
    let mut processed = 0;
    while let Ok(Some(_)) = tokio::time::timeout(idle, store.process_next()).await {
        processed += 1;
    }
    processed
}

/// Pause the Tokio clock (requires the `testing-time` feature)
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume the Tokio clock
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Move the paused clock forward, firing due timers
#[cfg(feature = "testing-time")]
pub async fn advance_time(by: Duration) {
    tokio::time::advance(by).await;
}

/// Assert that an intent matching a pattern was dispatched.
///
/// # Example
///
/// ```ignore
/// use form_dispatch::assert_dispatched;
///
/// let intents = recorder.intents();
/// assert_dispatched!(intents, Intent::FormSubmit);
/// assert_dispatched!(intents, Intent::SubmitDidFail(detail) if detail.contains("credentials"));
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($intents:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $intents.iter().any(|i| matches!(i, $pattern $(if $guard)?)),
            "Expected intent matching `{}` to be dispatched, but got: {:?}",
            stringify!($pattern),
            $intents
        );
    };
}

/// Assert that no intent matching a pattern was dispatched.
#[macro_export]
macro_rules! assert_not_dispatched {
    ($intents:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$intents.iter().any(|i| matches!(i, $pattern $(if $guard)?)),
            "Expected intent matching `{}` NOT to be dispatched, but it was: {:?}",
            stringify!($pattern),
            $intents
        );
    };
}

/// Count how many intents match a pattern.
///
/// ```ignore
/// assert_eq!(count_dispatched!(recorder.intents(), Intent::SubmitDidSucceed(_)), 1);
/// ```
#[macro_export]
macro_rules! count_dispatched {
    ($intents:expr, $pattern:pat $(if $guard:expr)?) => {
        $intents.iter().filter(|i| matches!(i, $pattern $(if $guard)?)).count()
    };
}

/// Find the first intent matching a pattern.
#[macro_export]
macro_rules! find_dispatched {
    ($intents:expr, $pattern:pat $(if $guard:expr)?) => {
        $intents.iter().find(|i| matches!(i, $pattern $(if $guard)?))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum TestIntent {
        Set(i32),
        Clear,
    }

    impl Intent for TestIntent {
        fn kind(&self) -> &'static str {
            match self {
                TestIntent::Set(_) => "Set",
                TestIntent::Clear => "Clear",
            }
        }
    }

    fn reducer(state: &mut i32, intent: TestIntent) -> bool {
        let next = match intent {
            TestIntent::Set(n) => n,
            TestIntent::Clear => 0,
        };
        std::mem::replace(state, next) != next
    }

    #[test]
    fn test_recorder_and_macros() {
        let recorder = IntentRecorder::new();
        let mut store = Store::builder(0, reducer)
            .middleware(recorder.clone())
            .build();

        store.dispatch(TestIntent::Set(3)).unwrap();
        store.dispatch(TestIntent::Set(3)).unwrap();
        store.dispatch(TestIntent::Clear).unwrap();

        let intents = recorder.intents();
        assert_dispatched!(intents, TestIntent::Set(n) if *n == 3);
        assert_not_dispatched!(intents, TestIntent::Set(4));
        assert_eq!(count_dispatched!(intents, TestIntent::Set(_)), 2);
        assert_eq!(find_dispatched!(intents, TestIntent::Clear), Some(&TestIntent::Clear));
        assert_eq!(recorder.kinds(), vec!["Set", "Set", "Clear"]);
        assert_eq!(recorder.count("Set"), 2);

        assert_eq!(recorder.drain().len(), 3);
        assert!(recorder.intents().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_transport() {
        let transport = ScriptedTransport::new()
            .respond(Duration::from_millis(200), Ok(Session::new("t1")))
            .fail(TransportError::Unauthorized("bad password".into()));

        let values = FieldValues::from([("email".to_string(), "a@b.com".to_string())]);
        assert_eq!(
            transport.submit_credentials(values.clone()).await,
            Ok(Session::new("t1"))
        );
        assert_eq!(
            transport.submit_credentials(values.clone()).await,
            Err(TransportError::Unauthorized("bad password".into()))
        );
        assert!(matches!(
            transport.submit_credentials(values.clone()).await,
            Err(TransportError::Network(_))
        ));
        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.submitted()[0], values);
    }
}
