//! form-dispatch: Centralized state, effects and validation for interactive forms
//!
//! Like Redux with sagas, but typed. Intents flow through an ordered
//! middleware chain into a reducer; an effect coordinator turns trigger
//! intents into async tasks whose outcomes re-enter the chain.
//!
//! # Example
//! ```ignore
//! use form_dispatch::prelude::*;
//!
//! #[derive(Intent, Clone, Debug)]
//! #[intent(summary)]
//! enum LoginIntent {
//!     FieldChange { field: String, value: String },
//!     FormSubmit,
//!     SubmitDidSucceed(Session),
//!     SubmitDidFail(String),
//! }
//!
//! let validator = Validator::login();
//! let mut store = Store::builder(FormState::new(&validator), reducer)
//!     .middleware(effects)
//!     .middleware(IntentLogger::log_all())
//!     .build();
//! ```

// Re-export everything from core
pub use form_dispatch_core::*;

// Re-export derive macros
pub use form_dispatch_macros::Intent;

/// Prelude for convenient imports
pub mod prelude {
    pub use form_dispatch_core::prelude::*;

    // Derive macros
    pub use form_dispatch_macros::Intent;
}
