use thiserror::Error;

use crate::job::SourceId;

/// Errors from the request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot handle {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("no job for source {source_id}")]
    NoSuchJob { source_id: SourceId },

    #[error("not waiting for merge indices")]
    NotAwaitingMergeIndices,

    #[error("no cancellation waiting for confirmation")]
    NothingToConfirm,

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl LifecycleError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}
