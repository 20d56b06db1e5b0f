//! Per-requester conversation state and its transition table.

use serde::Serialize;

use super::error::LifecycleError;
use crate::job::SourceId;

/// Where a requester's conversation stands.
///
/// A job keeps running while its requester is asked to confirm a
/// cancellation; declining returns to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// Admitted with the merge option, waiting for the indices to merge.
    AwaitingMergeIndices { source_id: SourceId },
    Running { source_id: SourceId },
    /// Running, with a cancel request waiting for y/n.
    AwaitingConfirmation { source_id: SourceId },
    /// Cancel confirmed, cleanup in progress.
    Cancelled { source_id: SourceId },
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingMergeIndices { .. } => "awaiting_merge_indices",
            Self::Running { .. } => "running",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Source the conversation is about, if any.
    pub fn source_id(&self) -> Option<SourceId> {
        match *self {
            Self::Idle => None,
            Self::AwaitingMergeIndices { source_id }
            | Self::Running { source_id }
            | Self::AwaitingConfirmation { source_id }
            | Self::Cancelled { source_id } => Some(source_id),
        }
    }
}

/// Inputs that move a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// An admitted create request.
    Admitted { source_id: SourceId, merge: bool },
    MergeIndicesReceived,
    MergeIndicesTimedOut,
    CancelRequested { source_id: SourceId },
    CancelConfirmed,
    /// The requester said no, or the confirmation lapsed.
    CancelDeclined,
    /// Shutdown, without confirmation.
    Abort,
    /// The job's cleanup ran.
    JobFinished,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "admitted",
            Self::MergeIndicesReceived => "merge_indices_received",
            Self::MergeIndicesTimedOut => "merge_indices_timed_out",
            Self::CancelRequested { .. } => "cancel_requested",
            Self::CancelConfirmed => "cancel_confirmed",
            Self::CancelDeclined => "cancel_declined",
            Self::Abort => "abort",
            Self::JobFinished => "job_finished",
        }
    }
}

/// The transition table. Anything not listed is rejected.
pub fn transition(
    state: SessionState,
    event: SessionEvent,
) -> Result<SessionState, LifecycleError> {
    use SessionEvent as E;
    use SessionState as S;

    let next = match (state, event) {
        (S::Idle, E::Admitted { source_id, merge: false }) => S::Running { source_id },
        (S::Idle, E::Admitted { source_id, merge: true }) => {
            S::AwaitingMergeIndices { source_id }
        }

        (S::AwaitingMergeIndices { source_id }, E::MergeIndicesReceived) => {
            S::Running { source_id }
        }
        (S::AwaitingMergeIndices { .. }, E::MergeIndicesTimedOut) => S::Idle,
        // Nothing runs yet, so there is nothing to confirm.
        (S::AwaitingMergeIndices { source_id }, E::CancelRequested { source_id: target })
            if source_id == target =>
        {
            S::Cancelled { source_id }
        }

        (S::Running { source_id }, E::CancelRequested { source_id: target })
            if source_id == target =>
        {
            S::AwaitingConfirmation { source_id }
        }
        (S::AwaitingConfirmation { source_id }, E::CancelConfirmed) => S::Cancelled { source_id },
        (S::AwaitingConfirmation { source_id }, E::CancelDeclined) => S::Running { source_id },

        (
            S::AwaitingMergeIndices { source_id }
            | S::Running { source_id }
            | S::AwaitingConfirmation { source_id },
            E::Abort,
        ) => S::Cancelled { source_id },

        (
            S::AwaitingMergeIndices { .. }
            | S::Running { .. }
            | S::AwaitingConfirmation { .. }
            | S::Cancelled { .. },
            E::JobFinished,
        ) => S::Idle,

        (state, event) => {
            return Err(LifecycleError::InvalidTransition {
                state: state.as_str(),
                event: event.as_str(),
            })
        }
    };
    Ok(next)
}
