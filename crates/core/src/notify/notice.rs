use std::fmt;

use serde::Serialize;

use crate::admission::{BusyReason, Rejection};
use crate::job::SourceId;

/// A message sent to a requester.
///
/// Every rejection and every failure produces exactly one notice. Detail
/// behind a failure is logged, not sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    Started { source_id: SourceId },
    AskMergeIndices { source_id: SourceId, timeout_secs: u64 },
    MergeIndicesTimedOut { source_id: SourceId },
    Rejected { rejection: Rejection },
    AlreadyPublished { source_id: SourceId, url: String },
    NothingToOverwrite { source_id: SourceId },
    RegistryUnavailable,
    NotFound { source_id: SourceId },
    Failed { source_id: SourceId },
    TimedOut { source_id: SourceId },
    Completed { title: String, url: String },
    ConfirmCancel { source_id: SourceId, timeout_secs: u64 },
    CancelKept { source_id: SourceId },
    Cancelled { source_id: SourceId },
    NoSuchJob { source_id: SourceId },
    Usage { usage: String },
    InvalidInput { reason: String },
}

impl Notice {
    pub fn usage(usage: impl Into<String>) -> Self {
        Self::Usage {
            usage: usage.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Whether the notice reports a rejection or failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. }
                | Self::NothingToOverwrite { .. }
                | Self::RegistryUnavailable
                | Self::NotFound { .. }
                | Self::Failed { .. }
                | Self::TimedOut { .. }
                | Self::NoSuchJob { .. }
                | Self::Usage { .. }
                | Self::InvalidInput { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { source_id } => write!(f, "Started working on {}.", source_id),
            Self::AskMergeIndices {
                source_id,
                timeout_secs,
            } => write!(
                f,
                "Which items of {} should be merged with the next one? \
                 Reply with numbers, e.g. 1 3 5 ({}s).",
                source_id, timeout_secs
            ),
            Self::MergeIndicesTimedOut { source_id } => write!(
                f,
                "No merge numbers received for {}. Request dropped.",
                source_id
            ),
            Self::Rejected { rejection } => match rejection {
                Rejection::Busy {
                    reason: BusyReason::NoFreeSlot { .. },
                } => write!(f, "Too many jobs are running. Please try again later."),
                Rejection::Busy {
                    reason: BusyReason::RequesterInFlight { source_id },
                } => write!(f, "You already have {} in progress.", source_id),
                Rejection::Duplicate { source_id } => write!(
                    f,
                    "{} is already being processed. Please wait a moment.",
                    source_id
                ),
                Rejection::Quota { limit } => {
                    write!(f, "Daily limit of {} requests reached.", limit)
                }
            },
            Self::AlreadyPublished { url, .. } => {
                write!(f, "This sticker set already exists.\n\n{}", url)
            }
            Self::NothingToOverwrite { source_id } => write!(
                f,
                "No sticker set is registered for {}. Retry without -o.",
                source_id
            ),
            Self::RegistryUnavailable => write!(
                f,
                "Something went wrong. If it keeps happening, contact the operator."
            ),
            Self::NotFound { source_id } => write!(f, "{} was not found in the gallery.", source_id),
            Self::Failed { source_id } => write!(f, "Failed to build stickers for {}.", source_id),
            Self::TimedOut { source_id } => write!(f, "The job for {} timed out.", source_id),
            Self::Completed { url, .. } => write!(f, "{}", url),
            Self::ConfirmCancel {
                source_id,
                timeout_secs,
            } => write!(
                f,
                "Really cancel the job for {}? [y/n] ({}s)",
                source_id, timeout_secs
            ),
            Self::CancelKept { source_id } => write!(f, "The job for {} keeps running.", source_id),
            Self::Cancelled { source_id } => write!(f, "Cancelled the job for {}.", source_id),
            Self::NoSuchJob { source_id } => write!(f, "There is no job for {}.", source_id),
            Self::Usage { usage } => write!(f, "Usage: {}", usage),
            Self::InvalidInput { reason } => write!(f, "Invalid input: {}", reason),
        }
    }
}
