//! Types for the admission module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::job::{JobPhase, RequesterId, SourceId};

/// Proof that a job was admitted. Hand it back via `release` when the job ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionTicket {
    pub job_id: Uuid,
    pub requester_id: RequesterId,
    pub source_id: SourceId,
    pub admitted_at: DateTime<Utc>,
}

/// Why a busy rejection happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusyReason {
    /// Every job slot is taken.
    NoFreeSlot { capacity: usize },
    /// The requester already has a job in flight.
    RequesterInFlight { source_id: SourceId },
}

/// Reasons an admission attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rejection {
    #[error("busy: {}", describe_busy(.reason))]
    Busy { reason: BusyReason },

    #[error("source {source_id} is already being processed")]
    Duplicate { source_id: SourceId },

    #[error("daily limit of {limit} requests reached")]
    Quota { limit: u32 },
}

fn describe_busy(reason: &BusyReason) -> String {
    match reason {
        BusyReason::NoFreeSlot { capacity } => format!("all {} job slots are taken", capacity),
        BusyReason::RequesterInFlight { source_id } => {
            format!("requester already has source {} in flight", source_id)
        }
    }
}

impl Rejection {
    /// Short machine-readable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::Busy { .. } => "busy",
            Rejection::Duplicate { .. } => "duplicate",
            Rejection::Quota { .. } => "quota",
        }
    }
}

/// Snapshot of one admitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InFlightJob {
    pub job_id: Uuid,
    pub requester_id: RequesterId,
    pub source_id: SourceId,
    pub phase: JobPhase,
    pub admitted_at: DateTime<Utc>,
}
