//! Middleware chain wrapping the store's dispatch entry point

use crate::error::DispatchError;
use crate::store::{Core, StoreHandle};
use crate::Intent;

/// Middleware trait for intercepting intents
///
/// Stages run in registration order. Each stage decides what reaches the
/// rest of the chain by calling [`Next::run`]:
/// - zero times to drop the intent
/// - once to pass it on (possibly transformed)
/// - several times to fan it out
///
/// The terminal stage is always the store's reducer. Returning an error
/// aborts the current dispatch: nothing is committed and every stage gets
/// [`Middleware::on_abort`].
pub trait Middleware<S, I: Intent>: Send {
    /// Stage name for logs and errors
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Handle an intent. Returns whether the rest of the chain changed state.
    fn intercept(&mut self, intent: I, next: &mut Next<'_, S, I>) -> Result<bool, DispatchError>;

    /// Called once the dispatch finished and its result is committed.
    ///
    /// Side effects that must not escape an aborted dispatch belong here.
    fn on_commit(&mut self, _store: &StoreHandle<S, I>) {}

    /// Called when any stage aborted the dispatch.
    fn on_abort(&mut self, _error: &DispatchError) {}
}

/// The remainder of the chain as seen from one stage
pub struct Next<'a, S, I: Intent> {
    rest: &'a mut [Box<dyn Middleware<S, I>>],
    core: &'a mut Core<S, I>,
}

impl<'a, S: Clone, I: Intent> Next<'a, S, I> {
    pub(crate) fn new(rest: &'a mut [Box<dyn Middleware<S, I>>], core: &'a mut Core<S, I>) -> Self {
        Self { rest, core }
    }

    /// Pass an intent to the next stage (or the reducer)
    pub fn run(&mut self, intent: I) -> Result<bool, DispatchError> {
        match self.rest.split_first_mut() {
            Some((stage, rest)) => {
                let mut next = Next {
                    rest,
                    core: &mut *self.core,
                };
                stage.intercept(intent, &mut next)
            }
            None => Ok(self.core.reduce(intent)),
        }
    }

    /// State as reduced so far in this dispatch (not yet committed)
    pub fn state(&self) -> &S {
        &self.core.draft
    }

    /// Queue an intent. It runs from the top of the chain after the current dispatch.
    pub fn dispatch(&self, intent: I) -> bool {
        self.core.handle.dispatch(intent)
    }

    /// Handle to the store
    pub fn handle(&self) -> &StoreHandle<S, I> {
        &self.core.handle
    }
}

/// A no-op middleware that passes everything through
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<S: Clone, I: Intent> Middleware<S, I> for NoopMiddleware {
    fn intercept(&mut self, intent: I, next: &mut Next<'_, S, I>) -> Result<bool, DispatchError> {
        next.run(intent)
    }
}

/// Middleware built from a closure, see [`intercept_fn`]
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

/// Build a middleware stage from a closure
///
/// # Example
///
/// ```ignore
/// let drop_unknown = intercept_fn("drop-unknown", |intent: Intent, next: &mut Next<'_, AppState, Intent>| {
///     if matches!(intent, Intent::Unknown) {
///         return Ok(false);
///     }
///     next.run(intent)
/// });
/// ```
pub fn intercept_fn<S, I, F>(name: &'static str, f: F) -> FnMiddleware<F>
where
    I: Intent,
    F: FnMut(I, &mut Next<'_, S, I>) -> Result<bool, DispatchError> + Send,
{
    FnMiddleware { name, f }
}

impl<S, I, F> Middleware<S, I> for FnMiddleware<F>
where
    I: Intent,
    F: FnMut(I, &mut Next<'_, S, I>) -> Result<bool, DispatchError> + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn intercept(&mut self, intent: I, next: &mut Next<'_, S, I>) -> Result<bool, DispatchError> {
        (self.f)(intent, next)
    }
}
