//! Types for the job module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the person who asked for a conversion.
pub type RequesterId = i64;

/// Identifier of a source asset in the gallery.
pub type SourceId = u64;

/// Options a requester can attach to a create command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionFlags {
    /// Rebuild a set that is already registered (`-o`).
    #[serde(default)]
    pub overwrite: bool,
    /// Fuse selected adjacent items into one sticker (`-m`).
    #[serde(default)]
    pub merge: bool,
}

impl OptionFlags {
    const OVERWRITE: u8 = 0b01;
    const MERGE: u8 = 0b10;

    /// Packs the flags into the bit set used by the registry.
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.overwrite {
            bits |= Self::OVERWRITE;
        }
        if self.merge {
            bits |= Self::MERGE;
        }
        bits
    }

    /// Unpacks a registry bit set. Unknown bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            overwrite: bits & Self::OVERWRITE != 0,
            merge: bits & Self::MERGE != 0,
        }
    }

    /// Short command-line style suffix (" -m", " -o" or empty).
    pub fn suffix(&self) -> &'static str {
        if self.merge {
            " -m"
        } else if self.overwrite {
            " -o"
        } else {
            ""
        }
    }
}

/// Phase of an in-flight job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Waiting for the requester to send merge indices.
    Pending,
    /// Fetching metadata and raw frames.
    Fetching,
    /// Upscaling frames.
    Upscaling,
    /// Running the size-constrained encoder.
    Encoding,
    /// Creating the sticker set and registering it.
    Publishing,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
    /// Cancelled by the requester or by shutdown.
    Cancelled,
}

impl JobPhase {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Failed | JobPhase::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Pending => "pending",
            JobPhase::Fetching => "fetching",
            JobPhase::Upscaling => "upscaling",
            JobPhase::Encoding => "encoding",
            JobPhase::Publishing => "publishing",
            JobPhase::Done => "done",
            JobPhase::Failed => "failed",
            JobPhase::Cancelled => "cancelled",
        }
    }
}

/// One requester's end-to-end request to convert one source asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub requester_id: RequesterId,
    /// Display name used in registry records.
    pub requester_name: String,
    pub source_id: SourceId,
    pub flags: OptionFlags,
    /// 1-based indices `i` whose item is fused with item `i + 1`.
    #[serde(default)]
    pub merge_indices: Vec<u32>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        requester_id: RequesterId,
        requester_name: impl Into<String>,
        source_id: SourceId,
        flags: OptionFlags,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id,
            requester_name: requester_name.into(),
            source_id,
            flags,
            merge_indices: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_merge_indices(mut self, indices: Vec<u32>) -> Self {
        self.merge_indices = indices;
        self
    }
}
