//! Error types for the synchronization engine.
//!
//! Errors are classified by recoverability:
//! - TransientFetch: a one-shot fetch failed, re-selecting the date retries
//! - Listener: a live subscription failed, stream degrades, no auto-retry
//! - Validation: bad user input, rejected before any store call
//! - Mutation: a create/update/delete failed, state corrects via listeners

use serde::Serialize;
use thiserror::Error;

/// Which record stream an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Meals,
    Goal,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Meals => write!(f, "meals"),
            StreamKind::Goal => write!(f, "goal"),
        }
    }
}

/// Error raised by the engine. Synchronizers never propagate these past
/// their boundary; each becomes a status field on the view model.
#[derive(Debug, Error)]
pub enum AgendaError {
    #[error("Fetch failed for the {stream} stream: {message}")]
    TransientFetch { stream: StreamKind, message: String },

    #[error("Live subscription failed for the {stream} stream: {message}")]
    Listener { stream: StreamKind, message: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Mutation failed: {0}")]
    Mutation(String),
}

impl AgendaError {
    /// True when re-selecting the date re-runs the failed work.
    pub fn is_recoverable_by_reselect(&self) -> bool {
        matches!(
            self,
            AgendaError::TransientFetch { .. } | AgendaError::Listener { .. }
        )
    }

    /// User-facing recovery suggestion.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AgendaError::TransientFetch { .. } => "Re-select the date to retry.",
            AgendaError::Listener { .. } => {
                "Live updates stopped. Re-select the date to reconnect."
            }
            AgendaError::Validation(_) => "Enter a number greater than zero.",
            AgendaError::Mutation(_) => {
                "Try again. The log shows the store's last confirmed state."
            }
        }
    }
}

/// Serializable error projection for the presentation boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaFault {
    pub message: String,
    pub kind: FaultKind,
    pub can_retry_by_reselect: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FaultKind {
    TransientFetch,
    Listener,
    Validation,
    Mutation,
}

impl From<&AgendaError> for AgendaFault {
    fn from(err: &AgendaError) -> Self {
        let kind = match err {
            AgendaError::TransientFetch { .. } => FaultKind::TransientFetch,
            AgendaError::Listener { .. } => FaultKind::Listener,
            AgendaError::Validation(_) => FaultKind::Validation,
            AgendaError::Mutation(_) => FaultKind::Mutation,
        };

        AgendaFault {
            message: err.to_string(),
            kind,
            can_retry_by_reselect: err.is_recoverable_by_reselect(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
