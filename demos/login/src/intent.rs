//! Login intents
//!
//! Naming convention:
//! - `Field*` / `Form*`: dispatched by the rendering layer
//! - `SubmitDid*`: outcomes dispatched by the submit effect

use form_dispatch::{Intent, IntentSummary, Session};
use serde::{Deserialize, Serialize};

/// Every intent the login screen understands
///
/// Serialized as `{"kind": "...", "payload": ...}`.
#[derive(form_dispatch::Intent, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[intent(version = 1)]
#[serde(tag = "kind", content = "payload")]
pub enum LoginIntent {
    /// A field was edited
    FieldChange { field: String, value: String },

    /// Submit the form (triggers the submit effect)
    FormSubmit,

    /// Back to idle; cancels a pending submission
    FormReset,

    /// Result: credentials accepted
    SubmitDidSucceed(Session),

    /// Result: submission failed, with a message for the user
    SubmitDidFail(String),

    /// Anything outside the vocabulary. Reducers ignore it.
    #[serde(other)]
    Unknown,
}

impl LoginIntent {
    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldChange {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Parse one JSON line. Unknown kinds become [`LoginIntent::Unknown`].
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        match value.get("kind").and_then(serde_json::Value::as_str) {
            Some(kind) if !Self::knows_kind(kind) => {
                tracing::warn!(kind, "ignoring unknown intent kind");
                Ok(Self::Unknown)
            }
            _ => serde_json::from_value(value),
        }
    }
}

/// Keeps secrets out of the intent log
impl IntentSummary for LoginIntent {
    fn summary(&self) -> String {
        match self {
            LoginIntent::FieldChange { field, value } if field == "password" => {
                format!("FieldChange {{ password: {} chars }}", value.chars().count())
            }
            LoginIntent::FieldChange { field, value } => {
                format!("FieldChange {{ {field}: {value:?} }}")
            }
            LoginIntent::SubmitDidSucceed(session) => match &session.user {
                Some(user) => format!("SubmitDidSucceed {{ user: {user:?} }}"),
                None => "SubmitDidSucceed".to_string(),
            },
            _ => format!("{:?}", self),
        }
    }
}
