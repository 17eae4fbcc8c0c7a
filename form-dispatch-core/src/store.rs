//! Centralized state store with reducer pattern

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::middleware::{Middleware, Next};
use crate::Intent;

/// A reducer that handles intents and mutates a draft of the state
///
/// Returns `true` if the draft changed. The store commits the draft as a
/// new snapshot only when it did.
pub type Reducer<S, I> = Box<dyn Fn(&mut S, I) -> bool + Send>;

type Listener<S, I> = Box<dyn FnMut(&Arc<S>, &StoreHandle<S, I>) + Send>;

/// Identifies a subscribed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An intent waiting in the store's queue
pub(crate) struct Envelope<I> {
    pub(crate) intent: I,
    /// Set for intents emitted by effect routines
    pub(crate) origin: Option<CancellationToken>,
}

impl<I> Envelope<I> {
    fn is_stale(&self) -> bool {
        self.origin
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Cloneable dispatch/getState handle
///
/// Intents dispatched through a handle are queued and run from the top of
/// the middleware chain once the store is free: after the current dispatch
/// when called synchronously, or on the next [`Store::process_next`] when
/// called from a task.
pub struct StoreHandle<S, I> {
    tx: mpsc::UnboundedSender<Envelope<I>>,
    snapshots: watch::Receiver<Arc<S>>,
}

impl<S, I> Clone for StoreHandle<S, I> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<S, I: Intent> StoreHandle<S, I> {
    /// Queue an intent. Returns `false` if the store is gone.
    pub fn dispatch(&self, intent: I) -> bool {
        self.send(intent, None)
    }

    pub(crate) fn send(&self, intent: I, origin: Option<CancellationToken>) -> bool {
        self.tx.send(Envelope { intent, origin }).is_ok()
    }

    /// Latest committed snapshot
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver that observes every committed snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<S>> {
        self.snapshots.clone()
    }
}

/// State owned by the dispatch path
pub(crate) struct Core<S, I> {
    pub(crate) committed: Arc<S>,
    pub(crate) draft: Arc<S>,
    reducer: Reducer<S, I>,
    pub(crate) handle: StoreHandle<S, I>,
}

impl<S: Clone, I> Core<S, I> {
    pub(crate) fn reduce(&mut self, intent: I) -> bool {
        let mut next = S::clone(&self.draft);
        if (self.reducer)(&mut next, intent) {
            self.draft = Arc::new(next);
            true
        } else {
            false
        }
    }
}

/// Centralized state store with Redux-like reducer pattern
///
/// The store holds the application state and provides a single point
/// for state mutations through the middleware chain and the reducer.
///
/// # Type Parameters
/// * `S` - The application state type
/// * `I` - The intent type (must implement `Intent`)
///
/// # Example
/// ```ignore
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: i32,
/// }
///
/// #[derive(Intent, Clone, Debug)]
/// enum AppIntent {
///     Increment,
///     Decrement,
/// }
///
/// fn reducer(state: &mut AppState, intent: AppIntent) -> bool {
///     match intent {
///         AppIntent::Increment => {
///             state.counter += 1;
///             true
///         }
///         AppIntent::Decrement => {
///             state.counter -= 1;
///             true
///         }
///     }
/// }
///
/// let mut store = Store::new(AppState::default(), reducer);
/// store.dispatch(AppIntent::Increment)?;
/// assert_eq!(store.state().counter, 1);
/// ```
pub struct Store<S, I: Intent> {
    core: Core<S, I>,
    chain: Vec<Box<dyn Middleware<S, I>>>,
    listeners: Vec<(ListenerId, Listener<S, I>)>,
    next_listener: u64,
    queue: mpsc::UnboundedReceiver<Envelope<I>>,
    snapshots: watch::Sender<Arc<S>>,
}

impl<S, I> Store<S, I>
where
    S: Clone + Send + Sync + 'static,
    I: Intent,
{
    /// Create a new store with initial state and reducer, without middleware
    pub fn new<R>(state: S, reducer: R) -> Self
    where
        R: Fn(&mut S, I) -> bool + Send + 'static,
    {
        Self::builder(state, reducer).build()
    }

    /// Start configuring a store with middleware
    pub fn builder<R>(state: S, reducer: R) -> StoreBuilder<S, I>
    where
        R: Fn(&mut S, I) -> bool + Send + 'static,
    {
        StoreBuilder {
            state,
            reducer: Box::new(reducer),
            chain: Vec::new(),
        }
    }

    /// Dispatch an intent through the middleware chain and the reducer
    ///
    /// Returns `true` if the state changed. Intents queued while this one
    /// is processed (by listeners or middleware) run before this returns,
    /// in the order they were issued.
    pub fn dispatch(&mut self, intent: I) -> Result<bool, DispatchError> {
        let result = self.process(intent);
        self.drain();
        result
    }

    /// Get a reference to the current state
    pub fn state(&self) -> &S {
        &self.core.committed
    }

    /// Get the current snapshot
    pub fn snapshot(&self) -> Arc<S> {
        Arc::clone(&self.core.committed)
    }

    /// Get a dispatch/getState handle for tasks and other consumers
    pub fn handle(&self) -> StoreHandle<S, I> {
        self.core.handle.clone()
    }

    /// Register a listener that runs after every committed change
    ///
    /// Listeners run synchronously in subscription order. Intents they
    /// dispatch through the handle are processed after the whole
    /// notification cycle.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Arc<S>, &StoreHandle<S, I>) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of middleware stages
    pub fn middleware_len(&self) -> usize {
        self.chain.len()
    }

    /// Wait for one queued intent (e.g. an effect outcome) and process it
    ///
    /// Intents from cancelled effect tasks are skipped. Returns `None` once
    /// every handle has been dropped.
    pub async fn process_next(&mut self) -> Option<Result<bool, DispatchError>> {
        loop {
            let envelope = self.queue.recv().await?;
            if let Some(result) = self.process_envelope(envelope) {
                self.drain();
                return Some(result);
            }
        }
    }

    /// Process queued intents until `done` holds for the committed state
    pub async fn run_until<F>(&mut self, mut done: F)
    where
        F: FnMut(&S) -> bool,
    {
        while !done(self.state()) {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    /// Process queued intents until `shutdown` is cancelled
    pub async fn run(&mut self, shutdown: CancellationToken) {
        loop {
            let envelope = tokio::select! {
                _ = shutdown.cancelled() => break,
                envelope = self.queue.recv() => envelope,
            };
            let Some(envelope) = envelope else {
                break;
            };
            self.process_envelope(envelope);
            self.drain();
        }
    }

    fn drain(&mut self) {
        while let Ok(envelope) = self.queue.try_recv() {
            self.process_envelope(envelope);
        }
    }

    fn process_envelope(&mut self, envelope: Envelope<I>) -> Option<Result<bool, DispatchError>> {
        if envelope.is_stale() {
            tracing::debug!(
                intent = %envelope.intent.kind(),
                "dropping intent from cancelled effect"
            );
            return None;
        }
        Some(self.process(envelope.intent))
    }

    fn process(&mut self, intent: I) -> Result<bool, DispatchError> {
        let kind = intent.kind();
        // A reducer panic in an earlier dispatch may have left a draft behind
        self.core.draft = Arc::clone(&self.core.committed);

        let result = Next::new(&mut self.chain, &mut self.core).run(intent);

        match result {
            Ok(_) => {
                let changed = !Arc::ptr_eq(&self.core.committed, &self.core.draft);
                if changed {
                    self.core.committed = Arc::clone(&self.core.draft);
                    self.snapshots
                        .send_replace(Arc::clone(&self.core.committed));
                    tracing::debug!(intent = %kind, "state committed");
                }
                // Stage hooks before listeners: deferred work never outlives its dispatch
                for stage in &mut self.chain {
                    stage.on_commit(&self.core.handle);
                }
                if changed {
                    self.notify();
                }
                Ok(changed)
            }
            Err(error) => {
                self.core.draft = Arc::clone(&self.core.committed);
                tracing::warn!(intent = %kind, %error, "dispatch aborted");
                for stage in &mut self.chain {
                    stage.on_abort(&error);
                }
                Err(error)
            }
        }
    }

    fn notify(&mut self) {
        let state = Arc::clone(&self.core.committed);
        for (_, listener) in &mut self.listeners {
            listener(&state, &self.core.handle);
        }
    }
}

/// Configures the middleware chain of a [`Store`]
///
/// The chain is fixed once [`StoreBuilder::build`] returns.
pub struct StoreBuilder<S, I: Intent> {
    state: S,
    reducer: Reducer<S, I>,
    chain: Vec<Box<dyn Middleware<S, I>>>,
}

impl<S, I> StoreBuilder<S, I>
where
    S: Clone + Send + Sync + 'static,
    I: Intent,
{
    /// Append a middleware stage; stages see intents in the order they are added
    pub fn middleware<M: Middleware<S, I> + 'static>(mut self, middleware: M) -> Self {
        self.chain.push(Box::new(middleware));
        self
    }

    /// Finish configuration
    pub fn build(self) -> Store<S, I> {
        let state = Arc::new(self.state);
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(Arc::clone(&state));

        Store {
            core: Core {
                committed: Arc::clone(&state),
                draft: state,
                reducer: self.reducer,
                handle: StoreHandle {
                    tx,
                    snapshots: snapshot_rx,
                },
            },
            chain: self.chain,
            listeners: Vec::new(),
            next_listener: 0,
            queue: rx,
            snapshots,
        }
    }
}
