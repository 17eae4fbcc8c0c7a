//! Transport collaborator used by submission effects
//!
//! The core never talks to a backend itself. Effect routines receive a
//! [`Transport`] and turn its result into a settled intent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::FieldValues;

/// Session returned by a successful credential submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Why a submission did not produce a session.
///
/// The display text becomes the detail of a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// Backend refused the submitted values
    #[error("{0}")]
    Rejected(String),

    /// Credentials were not accepted
    #[error("invalid credentials: {0}")]
    Unauthorized(String),

    /// Backend answered with an unexpected status
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Submits credentials to a backend
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit_credentials(&self, values: FieldValues) -> Result<Session, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TransportError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
        assert_eq!(
            TransportError::Rejected("email already locked".into()).to_string(),
            "email already locked"
        );
        assert_eq!(
            TransportError::Server {
                status: 503,
                message: "maintenance".into()
            }
            .to_string(),
            "server error (503): maintenance"
        );
    }

    #[test]
    fn test_session_json() {
        let session: Session = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(session, Session::new("abc"));
        assert_eq!(
            serde_json::to_string(&Session::new("abc").with_user("ada")).unwrap(),
            r#"{"token":"abc","user":"ada"}"#
        );
    }
}
