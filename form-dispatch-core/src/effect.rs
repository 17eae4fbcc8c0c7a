//! Effect coordinator
//!
//! A middleware stage that watches dispatched intents for trigger kinds and
//! runs the matching effect routine as an independent task. Routines never
//! touch the state directly: they dispatch further intents, which re-enter
//! the middleware chain from the top.
//!
//! # Overview
//!
//! ```text
//! dispatch(Submit) ──► EffectCoordinator ──► ... ──► reducer
//!                            │ (after commit)
//!                            ▼
//!                     spawn routine task ──► ctx.dispatch(SubmitDidSucceed)
//!                                                   │
//!                            ┌──────────────────────┘
//!                            ▼
//!                     store queue ──► top of the chain
//! ```
//!
//! # Example
//!
//! ```ignore
//! use form_dispatch::effect::{EffectContext, EffectCoordinator, Trigger};
//! use form_dispatch::tasks::ConcurrencyPolicy;
//!
//! let effects = EffectCoordinator::new()
//!     .effect(
//!         Trigger::new(
//!             "FormSubmit",
//!             |_intent: Intent, ctx: EffectContext<AppState, Intent>| async move {
//!                 let values = ctx.state().login.values().clone();
//!                 let session = transport.submit_credentials(values).await?;
//!                 ctx.dispatch(Intent::SubmitDidSucceed(session));
//!                 Ok(())
//!             },
//!             |error| Intent::SubmitDidFail(error.to_string()),
//!         )
//!         .policy(ConcurrencyPolicy::LatestWins)
//!         .only_if_changed(),
//!     )?
//!     .cancel_on("FormReset", "FormSubmit")?;
//!
//! let store = Store::builder(AppState::default(), reducer)
//!     .middleware(effects)
//!     .build();
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, DispatchError, EffectError};
use crate::middleware::{Middleware, Next};
use crate::store::StoreHandle;
use crate::tasks::{ConcurrencyPolicy, TaskKey, TaskManager};
use crate::Intent;

/// Future returned by an effect routine
pub type EffectFuture = Pin<Box<dyn Future<Output = Result<(), EffectError>> + Send + 'static>>;

type Recover<I> = Arc<dyn Fn(EffectError) -> I + Send + Sync>;

/// Asynchronous procedure started by a trigger intent
///
/// Implemented for every `Fn(I, EffectContext<S, I>) -> impl Future<Output = Result<(), EffectError>>`.
pub trait EffectRoutine<S, I: Intent>: Send + Sync + 'static {
    /// Build the future for one run, given the triggering intent
    fn start(&self, intent: I, ctx: EffectContext<S, I>) -> EffectFuture;
}

impl<S, I, F, Fut> EffectRoutine<S, I> for F
where
    I: Intent,
    F: Fn(I, EffectContext<S, I>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
{
    fn start(&self, intent: I, ctx: EffectContext<S, I>) -> EffectFuture {
        Box::pin(self(intent, ctx))
    }
}

/// What a running routine can reach: dispatch, state and its cancellation
pub struct EffectContext<S, I> {
    store: StoreHandle<S, I>,
    token: CancellationToken,
    kind: &'static str,
}

impl<S, I> Clone for EffectContext<S, I> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            token: self.token.clone(),
            kind: self.kind,
        }
    }
}

impl<S, I: Intent> EffectContext<S, I> {
    /// Dispatch an intent back into the chain.
    ///
    /// Once the task is cancelled this does nothing and returns `false`.
    pub fn dispatch(&self, intent: I) -> bool {
        if self.token.is_cancelled() {
            tracing::debug!(
                effect = self.kind,
                intent = %intent.kind(),
                "effect cancelled, dropping intent"
            );
            return false;
        }
        self.store.send(intent, Some(self.token.clone()))
    }

    /// Latest committed state
    pub fn state(&self) -> Arc<S> {
        self.store.state()
    }

    /// Wait until the committed state satisfies `predicate`.
    ///
    /// Returns `None` if the task is cancelled first or the store is gone.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Option<Arc<S>>
    where
        F: FnMut(&S) -> bool,
    {
        let mut snapshots = self.store.watch();
        tokio::select! {
            found = snapshots.wait_for(|state| predicate(&**state)) => {
                found.ok().map(|state| Arc::clone(&state))
            }
            _ = self.token.cancelled() => None,
        }
    }

    /// Whether the task has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the task is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Trigger kind this routine runs for
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Plain store handle. Intents sent through it are not tied to this task.
    pub fn handle(&self) -> &StoreHandle<S, I> {
        &self.store
    }
}

/// Registration of one effect routine for a trigger kind
pub struct Trigger<S, I: Intent> {
    kind: &'static str,
    policy: ConcurrencyPolicy,
    only_if_changed: bool,
    routine: Arc<dyn EffectRoutine<S, I>>,
    recover: Recover<I>,
}

impl<S, I> Trigger<S, I>
where
    S: Send + Sync + 'static,
    I: Intent,
{
    /// Run `routine` whenever an intent of `kind` is dispatched.
    ///
    /// `recover` turns a routine failure (error or panic) into the intent
    /// that reports it.
    pub fn new<F, Fut, R>(kind: &'static str, routine: F, recover: R) -> Self
    where
        F: Fn(I, EffectContext<S, I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
        R: Fn(EffectError) -> I + Send + Sync + 'static,
    {
        Self::with_routine(kind, routine, recover)
    }

    /// Same as [`Trigger::new`] for any [`EffectRoutine`] implementation
    pub fn with_routine<E, R>(kind: &'static str, routine: E, recover: R) -> Self
    where
        E: EffectRoutine<S, I>,
        R: Fn(EffectError) -> I + Send + Sync + 'static,
    {
        Self {
            kind,
            policy: ConcurrencyPolicy::default(),
            only_if_changed: false,
            routine: Arc::new(routine),
            recover: Arc::new(recover),
        }
    }

    /// Set the concurrency policy (default: parallel)
    pub fn policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Only start when the triggering intent changed the state
    pub fn only_if_changed(mut self) -> Self {
        self.only_if_changed = true;
        self
    }

    /// Trigger kind
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

enum Deferred<I> {
    Start { kind: &'static str, intent: I },
    Cancel { by: &'static str, target: &'static str },
}

/// Middleware stage bridging intents to asynchronous effect routines.
///
/// Starts and cancellations requested during a dispatch are deferred until
/// the dispatch commits and are discarded if it aborts.
pub struct EffectCoordinator<S, I: Intent> {
    triggers: HashMap<&'static str, Trigger<S, I>>,
    cancellations: HashMap<&'static str, Vec<&'static str>>,
    tasks: TaskManager,
    deferred: Vec<Deferred<I>>,
}

impl<S, I> Default for EffectCoordinator<S, I>
where
    S: Send + Sync + 'static,
    I: Intent,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, I> EffectCoordinator<S, I>
where
    S: Send + Sync + 'static,
    I: Intent,
{
    /// Create a coordinator with no triggers
    pub fn new() -> Self {
        Self {
            triggers: HashMap::new(),
            cancellations: HashMap::new(),
            tasks: TaskManager::new(),
            deferred: Vec::new(),
        }
    }

    /// Register an effect routine
    pub fn effect(mut self, trigger: Trigger<S, I>) -> Result<Self, ConfigError> {
        let kind = trigger.kind;
        if !I::knows_kind(kind) {
            return Err(ConfigError::UnknownKind(kind));
        }
        if self.triggers.contains_key(kind) {
            return Err(ConfigError::DuplicateTrigger(kind));
        }
        self.triggers.insert(kind, trigger);
        Ok(self)
    }

    /// Cancel every running `target` routine whenever `kind` is dispatched
    pub fn cancel_on(mut self, kind: &'static str, target: &'static str) -> Result<Self, ConfigError> {
        for k in [kind, target] {
            if !I::knows_kind(k) {
                return Err(ConfigError::UnknownKind(k));
            }
        }
        self.cancellations.entry(kind).or_default().push(target);
        Ok(self)
    }

    /// Registered trigger kinds with their policies
    pub fn triggers(&self) -> impl Iterator<Item = (&'static str, ConcurrencyPolicy)> + '_ {
        self.triggers.values().map(|t| (t.kind, t.policy))
    }

    /// Running effect tasks
    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    fn start(&mut self, kind: &'static str, intent: I, store: &StoreHandle<S, I>) {
        let Some(trigger) = self.triggers.get(kind) else {
            return;
        };
        let policy = trigger.policy;
        let routine = Arc::clone(&trigger.routine);
        let recover = Arc::clone(&trigger.recover);
        let handle = store.clone();

        let spawned = self.tasks.spawn(kind, policy, move |token| {
            let ctx = EffectContext {
                store: handle,
                token,
                kind,
            };
            supervise(routine, recover, intent, ctx)
        });

        match spawned {
            Ok(handle) => {
                tracing::info!(effect = kind, ?policy, ?handle, "effect started");
            }
            Err(error) => {
                let error = match error {
                    EffectError::NoRuntime(_) => EffectError::NoRuntime(kind),
                    other => other,
                };
                tracing::error!(effect = kind, %error, "effect could not start");
                store.dispatch((trigger.recover)(error));
            }
        }
    }
}

impl<S, I> Middleware<S, I> for EffectCoordinator<S, I>
where
    S: Clone + Send + Sync + 'static,
    I: Intent,
{
    fn name(&self) -> &'static str {
        "effects"
    }

    fn intercept(&mut self, intent: I, next: &mut Next<'_, S, I>) -> Result<bool, DispatchError> {
        let kind = intent.kind();
        let gate = self.triggers.get(kind).map(|t| t.only_if_changed);
        let payload = gate.map(|_| intent.clone());

        let changed = next.run(intent)?;

        if let Some(targets) = self.cancellations.get(kind) {
            for &target in targets {
                self.deferred.push(Deferred::Cancel { by: kind, target });
            }
        }

        if let (Some(only_if_changed), Some(intent)) = (gate, payload) {
            if only_if_changed && !changed {
                tracing::debug!(effect = kind, "trigger left state unchanged, not starting");
            } else {
                self.deferred.push(Deferred::Start { kind, intent });
            }
        }

        Ok(changed)
    }

    fn on_commit(&mut self, store: &StoreHandle<S, I>) {
        for deferred in std::mem::take(&mut self.deferred) {
            match deferred {
                Deferred::Cancel { by, target } => {
                    tracing::debug!(effect = target, cancelled_by = by, "cancelling effect");
                    self.tasks.cancel(&TaskKey::from(target));
                }
                Deferred::Start { kind, intent } => self.start(kind, intent, store),
            }
        }
    }

    fn on_abort(&mut self, _error: &DispatchError) {
        if !self.deferred.is_empty() {
            tracing::debug!(count = self.deferred.len(), "discarding effects of aborted dispatch");
            self.deferred.clear();
        }
    }
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run a routine in its own task so panics are caught, and recover failures
async fn supervise<S, I>(
    routine: Arc<dyn EffectRoutine<S, I>>,
    recover: Recover<I>,
    intent: I,
    ctx: EffectContext<S, I>,
) where
    S: Send + Sync + 'static,
    I: Intent,
{
    let kind = ctx.kind;
    let inner = tokio::spawn(routine.start(intent, ctx.clone()));
    let _guard = AbortOnDrop(inner.abort_handle());

    let joined = tokio::select! {
        joined = inner => joined,
        _ = ctx.cancelled() => {
            tracing::info!(effect = kind, "effect cancelled");
            return;
        }
    };

    let error = match joined {
        Ok(Ok(())) => {
            tracing::debug!(effect = kind, "effect finished");
            return;
        }
        Ok(Err(error)) => error,
        Err(join) if join.is_panic() => EffectError::Panicked(panic_message(join.into_panic())),
        Err(_) => return,
    };

    tracing::warn!(effect = kind, %error, "effect failed");
    ctx.dispatch(recover(error));
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::intercept_fn;
    use crate::store::Store;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Debug, Default)]
    struct TestState {
        started: Vec<u32>,
        outcomes: Vec<u32>,
        failures: Vec<String>,
        ready: bool,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestIntent {
        Start(u32),
        Outcome(u32),
        Failed(String),
        Stop,
        Ready,
    }

    impl Intent for TestIntent {
        const KINDS: &'static [&'static str] = &["Start", "Outcome", "Failed", "Stop", "Ready"];

        fn kind(&self) -> &'static str {
            match self {
                TestIntent::Start(_) => "Start",
                TestIntent::Outcome(_) => "Outcome",
                TestIntent::Failed(_) => "Failed",
                TestIntent::Stop => "Stop",
                TestIntent::Ready => "Ready",
            }
        }
    }

    fn reducer(state: &mut TestState, intent: TestIntent) -> bool {
        match intent {
            TestIntent::Start(0) => false,
            TestIntent::Start(n) => {
                state.started.push(n);
                true
            }
            TestIntent::Outcome(n) => {
                state.outcomes.push(n);
                true
            }
            TestIntent::Failed(msg) => {
                state.failures.push(msg);
                true
            }
            TestIntent::Stop => false,
            TestIntent::Ready => {
                state.ready = true;
                true
            }
        }
    }

    type Ctx = EffectContext<TestState, TestIntent>;

    /// Sleeps `n * 50ms`, then reports `Outcome(n)`
    fn delayed_echo(runs: Arc<AtomicUsize>) -> Trigger<TestState, TestIntent> {
        Trigger::new(
            "Start",
            move |intent: TestIntent, ctx: Ctx| {
                runs.fetch_add(1, Ordering::SeqCst);
                async move {
                    if let TestIntent::Start(n) = intent {
                        tokio::time::sleep(Duration::from_millis(50 * u64::from(n))).await;
                        ctx.dispatch(TestIntent::Outcome(n));
                    }
                    Ok::<_, EffectError>(())
                }
            },
            |error| TestIntent::Failed(error.to_string()),
        )
    }

    fn store_with(coordinator: EffectCoordinator<TestState, TestIntent>) -> Store<TestState, TestIntent> {
        Store::builder(TestState::default(), reducer)
            .middleware(coordinator)
            .build()
    }

    async fn settle(store: &mut Store<TestState, TestIntent>) {
        // paused clock: auto-advances until every task is idle
        while let Ok(Some(_)) =
            tokio::time::timeout(Duration::from_secs(5), store.process_next()).await
        {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_reenters_chain_from_top() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let tap = seen.clone();
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = Store::builder(TestState::default(), reducer)
            .middleware(EffectCoordinator::new().effect(delayed_echo(runs)).unwrap())
            .middleware(intercept_fn(
                "tap",
                move |intent: TestIntent, next: &mut Next<'_, TestState, TestIntent>| {
                    tap.lock().push(intent.clone());
                    next.run(intent)
                },
            ))
            .build();

        store.dispatch(TestIntent::Start(1)).unwrap();
        store.run_until(|s| !s.outcomes.is_empty()).await;

        assert_eq!(store.state().outcomes, vec![1]);
        assert_eq!(*seen.lock(), vec![TestIntent::Start(1), TestIntent::Outcome(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_delivers_every_outcome() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(EffectCoordinator::new().effect(delayed_echo(runs.clone())).unwrap());

        store.dispatch(TestIntent::Start(2)).unwrap();
        store.dispatch(TestIntent::Start(1)).unwrap();
        settle(&mut store).await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        // resolution order, not dispatch order
        assert_eq!(store.state().outcomes, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_wins_delivers_only_newest_outcome() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(delayed_echo(runs.clone()).policy(ConcurrencyPolicy::LatestWins))
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(1)).unwrap();
        store.dispatch(TestIntent::Start(2)).unwrap();
        settle(&mut store).await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(store.state().outcomes, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_wins_drops_outcome_already_queued() {
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(
                    Trigger::new(
                        "Start",
                        |intent: TestIntent, ctx: Ctx| async move {
                            if let TestIntent::Start(n) = intent {
                                ctx.dispatch(TestIntent::Outcome(n));
                            }
                            Ok::<_, EffectError>(())
                        },
                        |error| TestIntent::Failed(error.to_string()),
                    )
                    .policy(ConcurrencyPolicy::LatestWins),
                )
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(1)).unwrap();
        // let the first routine finish and queue its outcome
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.dispatch(TestIntent::Start(2)).unwrap();
        settle(&mut store).await;

        assert_eq!(store.state().outcomes, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_queue_keeps_dispatch_order() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(delayed_echo(runs).policy(ConcurrencyPolicy::SerialQueue))
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(3)).unwrap();
        store.dispatch(TestIntent::Start(1)).unwrap();
        store.dispatch(TestIntent::Start(2)).unwrap();
        settle(&mut store).await;

        assert_eq!(store.state().outcomes, vec![3, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_if_changed_gate() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(delayed_echo(runs.clone()).only_if_changed())
                .unwrap(),
        );

        // Start(0) is a no-op in the reducer
        store.dispatch(TestIntent::Start(0)).unwrap();
        store.dispatch(TestIntent::Start(1)).unwrap();
        settle(&mut store).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(store.state().outcomes, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_routine_error_is_recovered_into_intent() {
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(Trigger::new(
                    "Start",
                    |_: TestIntent, _: Ctx| async move {
                        Err::<(), _>(EffectError::msg("backend unreachable"))
                    },
                    |error| TestIntent::Failed(error.to_string()),
                ))
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(1)).unwrap();
        store.run_until(|s| !s.failures.is_empty()).await;

        assert_eq!(store.state().failures, vec!["backend unreachable".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_routine_panic_is_recovered_into_intent() {
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(Trigger::new(
                    "Start",
                    |_: TestIntent, _: Ctx| async move {
                        if true {
                            panic!("routine bug");
                        }
                        Ok::<_, EffectError>(())
                    },
                    |error| TestIntent::Failed(error.to_string()),
                ))
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(1)).unwrap();
        store.run_until(|s| !s.failures.is_empty()).await;

        assert_eq!(
            store.state().failures,
            vec!["effect routine panicked: routine bug".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_on_stops_running_routine() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(delayed_echo(runs.clone()))
                .unwrap()
                .cancel_on("Stop", "Start")
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(1)).unwrap();
        store.dispatch(TestIntent::Stop).unwrap();
        settle(&mut store).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(store.state().outcomes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_dispatch_starts_nothing() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = Store::builder(TestState::default(), reducer)
            .middleware(EffectCoordinator::new().effect(delayed_echo(runs.clone())).unwrap())
            .middleware(intercept_fn(
                "reject-start-2",
                |intent: TestIntent, next: &mut Next<'_, TestState, TestIntent>| {
                    if intent == TestIntent::Start(2) {
                        return Err(DispatchError::rejected("reject-start-2", "Start", "nope"));
                    }
                    next.run(intent)
                },
            ))
            .build();

        assert!(store.dispatch(TestIntent::Start(2)).is_err());
        settle(&mut store).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(store.state().started.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_panic_leaves_no_start_for_next_dispatch() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(EffectCoordinator::new().effect(delayed_echo(runs.clone())).unwrap());
        store.subscribe(|state: &Arc<TestState>, _: &StoreHandle<TestState, TestIntent>| {
            if state.started == [1] && !state.ready {
                panic!("listener bug");
            }
        });

        let outcome = catch_unwind(AssertUnwindSafe(|| store.dispatch(TestIntent::Start(1))));
        assert!(outcome.is_err());
        tokio::time::sleep(Duration::from_millis(1)).await;
        // the committed dispatch started its routine before listeners ran
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        store.dispatch(TestIntent::Ready).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_routine_can_wait_for_state() {
        let mut store = store_with(
            EffectCoordinator::new()
                .effect(Trigger::new(
                    "Start",
                    |intent: TestIntent, ctx: Ctx| async move {
                        if ctx.wait_for(|s| s.ready).await.is_some() {
                            if let TestIntent::Start(n) = intent {
                                ctx.dispatch(TestIntent::Outcome(n));
                            }
                        }
                        Ok::<_, EffectError>(())
                    },
                    |error| TestIntent::Failed(error.to_string()),
                ))
                .unwrap(),
        );

        store.dispatch(TestIntent::Start(7)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.state().outcomes.is_empty());

        store.dispatch(TestIntent::Ready).unwrap();
        store.run_until(|s| !s.outcomes.is_empty()).await;
        assert_eq!(store.state().outcomes, vec![7]);
    }

    #[test]
    fn test_trigger_outside_runtime_is_recovered() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(EffectCoordinator::new().effect(delayed_echo(runs.clone())).unwrap());

        store.dispatch(TestIntent::Start(1)).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            store.state().failures,
            vec!["no Tokio runtime available to run the `Start` effect".to_string()]
        );
    }

    #[test]
    fn test_config_errors() {
        let runs = Arc::new(AtomicUsize::new(0));

        let unknown = EffectCoordinator::<TestState, TestIntent>::new().effect(Trigger::new(
            "Launch",
            |_: TestIntent, _: Ctx| async { Ok::<_, EffectError>(()) },
            |error| TestIntent::Failed(error.to_string()),
        ));
        assert!(matches!(unknown, Err(ConfigError::UnknownKind("Launch"))));

        let duplicate = EffectCoordinator::new()
            .effect(delayed_echo(runs.clone()))
            .unwrap()
            .effect(delayed_echo(runs));
        assert!(matches!(duplicate, Err(ConfigError::DuplicateTrigger("Start"))));

        let bad_cancel = EffectCoordinator::<TestState, TestIntent>::new().cancel_on("Halt", "Start");
        assert!(matches!(bad_cancel, Err(ConfigError::UnknownKind("Halt"))));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42)), "unknown panic");
    }
}
