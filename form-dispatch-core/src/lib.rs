//! Core traits and types for form-dispatch
//!
//! This crate provides the state and validation layer behind an interactive
//! form, following a Redux-inspired architecture.
//!
//! # Core Concepts
//!
//! - **Intent**: Requests to change state or to trigger an effect
//! - **Store**: Centralized state container with reducer pattern
//! - **Middleware**: Ordered interceptors around the store's dispatch entry point
//! - **EffectCoordinator**: Middleware that runs async routines for trigger intents
//! - **Validator** / **FormState**: Field validation and the submission lifecycle
//!
//! # Basic Example
//!
//! ```ignore
//! use form_dispatch_core::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! struct AppState {
//!     login: FormState,
//! }
//!
//! fn reducer(validator: &Validator, state: &mut AppState, intent: Intent) -> bool {
//!     match intent {
//!         Intent::FieldChange { field, value } => state.login.change_field(validator, &field, value),
//!         Intent::FormSubmit => state.login.begin_submit(),
//!         Intent::Unknown => false,
//!     }
//! }
//!
//! let validator = Validator::login();
//! let initial = AppState { login: FormState::new(&validator) };
//! let mut store = Store::new(initial, move |s: &mut AppState, i| reducer(&validator, s, i));
//! store.dispatch(Intent::FieldChange { field: "email".into(), value: "a@b.com".into() })?;
//! ```
//!
//! # Async Effect Pattern
//!
//! Long-running work uses two kinds of intents:
//!
//! 1. **Trigger intents** start an effect routine (e.g., `FormSubmit`)
//! 2. **Outcome intents** carry the result back (e.g., `SubmitDidSucceed`, `SubmitDidFail`)
//!
//! Outcome intents re-enter the middleware chain from the top, so every stage
//! (including the logger) observes them. The `Did*` naming convention
//! identifies outcome intents.

pub mod effect;
pub mod error;
pub mod form;
pub mod intent;
pub mod logger;
pub mod middleware;
pub mod navigation;
pub mod store;
pub mod tasks;
pub mod testing;
pub mod transport;
pub mod validation;

// Core trait exports
pub use intent::{Intent, IntentSummary};

// Error exports
pub use error::{ConfigError, DispatchError, EffectError};

// Store exports
pub use middleware::{intercept_fn, FnMiddleware, Middleware, Next, NoopMiddleware};
pub use store::{ListenerId, Reducer, Store, StoreBuilder, StoreHandle};

// Effect exports
pub use effect::{EffectContext, EffectCoordinator, EffectFuture, EffectRoutine, Trigger};
pub use tasks::{ConcurrencyPolicy, EffectHandle, TaskKey, TaskManager};

// Form exports
pub use form::{FormState, SubmissionStatus};
pub use validation::{ErrorMap, FieldValues, Rule, Validator};

// Collaborator exports
pub use navigation::Navigator;
pub use transport::{Session, Transport, TransportError};

pub use logger::{IntentLog, IntentLogConfig, IntentLogger, IntentLoggerConfig, SharedIntentLog};

// Testing exports
pub use testing::{settle, IntentRecorder, ScriptedTransport};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::effect::{EffectContext, EffectCoordinator, Trigger};
    pub use crate::error::{ConfigError, DispatchError, EffectError};
    pub use crate::form::{FormState, SubmissionStatus};
    pub use crate::intent::{Intent, IntentSummary};
    pub use crate::logger::{IntentLogConfig, IntentLogger, IntentLoggerConfig};
    pub use crate::middleware::{intercept_fn, Middleware, Next, NoopMiddleware};
    pub use crate::navigation::Navigator;
    pub use crate::store::{Store, StoreHandle};
    pub use crate::tasks::ConcurrencyPolicy;
    pub use crate::transport::{Session, Transport, TransportError};
    pub use crate::validation::{ErrorMap, FieldValues, Rule, Validator};
}
