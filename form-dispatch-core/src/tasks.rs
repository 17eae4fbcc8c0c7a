//! Task manager for effect routines
//!
//! Provides lifecycle management for async tasks grouped by key, with a
//! concurrency policy chosen per spawn:
//! - [`ConcurrencyPolicy::Parallel`]: every task runs independently
//! - [`ConcurrencyPolicy::LatestWins`]: spawning cancels every earlier task with the same key
//! - [`ConcurrencyPolicy::SerialQueue`]: tasks with the same key run one after another, FIFO
//!
//! Cancellation is cooperative. Each task receives a [`CancellationToken`];
//! the manager cancels the token and aborts the task at its next await point.
//!
//! # Example
//!
//! ```ignore
//! use form_dispatch::tasks::{ConcurrencyPolicy, TaskManager};
//!
//! let mut tasks = TaskManager::new();
//!
//! // Any earlier "submit" task is cancelled first
//! tasks.spawn("submit", ConcurrencyPolicy::LatestWins, |token| async move {
//!     if !token.is_cancelled() {
//!         send_outcome().await;
//!     }
//! })?;
//!
//! // Cancel all tasks (e.g., on shutdown)
//! tasks.cancel_all();
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::error::EffectError;

type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Identifies a group of tasks for cancellation and queueing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    /// Create a new task key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How tasks that share a key interact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyPolicy {
    /// Every spawn starts a new task
    #[default]
    Parallel,
    /// A new spawn cancels all running tasks with the same key
    LatestWins,
    /// Spawns run strictly one after another in arrival order
    SerialQueue,
}

impl std::str::FromStr for ConcurrencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel" => Ok(Self::Parallel),
            "latest-wins" => Ok(Self::LatestWins),
            "serial-queue" => Ok(Self::SerialQueue),
            other => Err(format!(
                "unknown policy `{other}` (expected parallel, latest-wins or serial-queue)"
            )),
        }
    }
}

/// Opaque token identifying a spawned task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(u64);

struct TrackedTask {
    handle: EffectHandle,
    token: CancellationToken,
    finished: Arc<AtomicBool>,
    /// `None` while the task waits in a serial queue
    abort: Option<AbortHandle>,
}

impl TrackedTask {
    fn is_done(&self) -> bool {
        self.finished.load(Ordering::Acquire) || self.token.is_cancelled()
    }

    fn cancel(&self) {
        self.token.cancel();
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }
}

struct QueuedTask {
    token: CancellationToken,
    finished: Arc<AtomicBool>,
    task: BoxedTask,
}

/// One worker per serial key, draining its queue in order
struct SerialQueue {
    tx: mpsc::UnboundedSender<QueuedTask>,
    worker: AbortHandle,
}

impl SerialQueue {
    fn start(runtime: &Handle, key: &TaskKey) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedTask>();
        let key = key.clone();
        let worker = runtime.spawn(async move {
            while let Some(queued) = rx.recv().await {
                if queued.token.is_cancelled() {
                    tracing::debug!(key = %key.name(), "skipping cancelled queued task");
                    continue;
                }
                tokio::select! {
                    _ = queued.task => {}
                    _ = queued.token.cancelled() => {
                        tracing::debug!(key = %key.name(), "queued task cancelled while running");
                    }
                }
                queued.finished.store(true, Ordering::Release);
            }
        });
        Self {
            tx,
            worker: worker.abort_handle(),
        }
    }
}

/// Manages async task lifecycle with per-key concurrency policies.
///
/// Requires a Tokio runtime when spawning; dropping the manager cancels
/// every task it still tracks.
#[derive(Default)]
pub struct TaskManager {
    next_id: u64,
    tasks: HashMap<TaskKey, Vec<TrackedTask>>,
    queues: HashMap<TaskKey, SerialQueue>,
}

impl TaskManager {
    /// Create a new task manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task under `key` following `policy`.
    ///
    /// `task` receives the task's cancellation token and returns the future
    /// to run. Fails with [`EffectError::NoRuntime`] outside a Tokio runtime.
    pub fn spawn<F, Fut>(
        &mut self,
        key: impl Into<TaskKey>,
        policy: ConcurrencyPolicy,
        task: F,
    ) -> Result<EffectHandle, EffectError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let runtime = Handle::try_current().map_err(|_| EffectError::NoRuntime("task"))?;

        match policy {
            ConcurrencyPolicy::LatestWins => self.cancel(&key),
            ConcurrencyPolicy::Parallel | ConcurrencyPolicy::SerialQueue => self.prune(&key),
        }

        let handle = EffectHandle(self.next_id);
        self.next_id += 1;

        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let done = finished.clone();
        let future = task(token.clone());
        let future: BoxedTask = Box::pin(async move {
            future.await;
            done.store(true, Ordering::Release);
        });

        let abort = match policy {
            ConcurrencyPolicy::SerialQueue => {
                let queue = self
                    .queues
                    .entry(key.clone())
                    .or_insert_with(|| SerialQueue::start(&runtime, &key));
                let queued = QueuedTask {
                    token: token.clone(),
                    finished: finished.clone(),
                    task: future,
                };
                if let Err(mpsc::error::SendError(queued)) = queue.tx.send(queued) {
                    // worker is gone, start a fresh one
                    let fresh = SerialQueue::start(&runtime, &key);
                    let _ = fresh.tx.send(queued);
                    self.queues.insert(key.clone(), fresh);
                }
                None
            }
            ConcurrencyPolicy::Parallel | ConcurrencyPolicy::LatestWins => {
                Some(runtime.spawn(future).abort_handle())
            }
        };

        self.tasks.entry(key).or_default().push(TrackedTask {
            handle,
            token,
            finished,
            abort,
        });
        Ok(handle)
    }

    /// Cancel every task under `key`, running or queued.
    ///
    /// Intents those tasks already emitted but the store has not yet
    /// processed are dropped as well. No-op for unknown keys.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(tasks) = self.tasks.remove(key) {
            for task in &tasks {
                task.cancel();
            }
            if !tasks.is_empty() {
                tracing::debug!(key = %key.name(), count = tasks.len(), "cancelled tasks");
            }
        }
    }

    /// Cancel a single task.
    pub fn cancel_handle(&mut self, handle: EffectHandle) -> bool {
        for tasks in self.tasks.values_mut() {
            if let Some(pos) = tasks.iter().position(|t| t.handle == handle) {
                tasks.remove(pos).cancel();
                return true;
            }
        }
        false
    }

    /// Cancel all tasks.
    ///
    /// Useful for cleanup on shutdown.
    pub fn cancel_all(&mut self) {
        for (_, tasks) in self.tasks.drain() {
            for task in tasks {
                task.cancel();
            }
        }
    }

    /// Check if any task under `key` is still running or queued.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.running(key) > 0
    }

    /// Number of running or queued tasks under `key`.
    pub fn running(&self, key: &TaskKey) -> usize {
        self.tasks
            .get(key)
            .map(|tasks| tasks.iter().filter(|t| !t.is_done()).count())
            .unwrap_or(0)
    }

    /// Get the number of running or queued tasks.
    pub fn len(&self) -> usize {
        self.tasks
            .values()
            .map(|tasks| tasks.iter().filter(|t| !t.is_done()).count())
            .sum()
    }

    /// Check if there are no running tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the keys that still have running or queued tasks.
    pub fn running_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks
            .iter()
            .filter(|(_, tasks)| tasks.iter().any(|t| !t.is_done()))
            .map(|(key, _)| key)
    }

    fn prune(&mut self, key: &TaskKey) {
        if let Some(tasks) = self.tasks.get_mut(key) {
            tasks.retain(|t| !t.is_done());
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.cancel_all();
        for (_, queue) in self.queues.drain() {
            queue.worker.abort();
        }
    }
}
