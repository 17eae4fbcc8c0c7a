//! Application state - single source of truth
//!
//! Only the reducer mutates it; the render listener and effects read
//! committed snapshots.

use form_dispatch::{FormState, Session, Validator};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct AppState {
    /// The login form: values, derived errors, submission status
    pub login: FormState,

    /// Session of the last successful login
    pub session: Option<Session>,
}

impl AppState {
    pub fn new(validator: &Validator) -> Self {
        Self {
            login: FormState::new(validator),
            session: None,
        }
    }

    /// Used by the navigation listener
    pub fn login_form(&self) -> &FormState {
        &self.login
    }
}
