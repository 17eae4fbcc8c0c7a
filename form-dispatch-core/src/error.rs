//! Error types shared across the dispatch pipeline

use thiserror::Error;

use crate::transport::TransportError;

/// A middleware stage faulted and the dispatch was aborted.
///
/// The committed state is left exactly as it was before the dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A stage refused the intent
    #[error("middleware `{stage}` rejected `{intent}`: {reason}")]
    Rejected {
        stage: &'static str,
        intent: &'static str,
        reason: String,
    },

    /// A stage hit an error of its own
    #[error("middleware `{stage}` failed on `{intent}`: {source}")]
    Failed {
        stage: &'static str,
        intent: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DispatchError {
    /// Build a [`DispatchError::Rejected`]
    pub fn rejected(stage: &'static str, intent: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            stage,
            intent,
            reason: reason.into(),
        }
    }

    /// Name of the stage that aborted the dispatch
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Rejected { stage, .. } | Self::Failed { stage, .. } => stage,
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A trigger or cancellation names a kind the intent type never produces
    #[error("intent kind `{0}` is not part of the intent vocabulary")]
    UnknownKind(&'static str),

    /// Two routines registered for the same trigger kind
    #[error("an effect is already registered for `{0}`")]
    DuplicateTrigger(&'static str),

    /// A validation pattern failed to compile
    #[error("invalid validation pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure inside an effect routine.
///
/// The coordinator never lets these escape: each one is turned into an
/// intent by the trigger's recovery function.
#[derive(Debug, Error)]
pub enum EffectError {
    /// The transport collaborator failed; displays as the transport's message
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The routine panicked
    #[error("effect routine panicked: {0}")]
    Panicked(String),

    /// A trigger fired while no Tokio runtime was available
    #[error("no Tokio runtime available to run the `{0}` effect")]
    NoRuntime(&'static str),

    /// Any other routine failure
    #[error("{0}")]
    Failed(String),
}

impl EffectError {
    /// Build an [`EffectError::Failed`] from a message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
