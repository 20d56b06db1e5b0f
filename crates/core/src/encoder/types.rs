//! Types for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Frames to encode into one size-bounded animation.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// Directory holding `000.png`, `001.png`, ...
    pub frames_dir: PathBuf,
    /// Display duration of each frame in milliseconds.
    pub durations_ms: Vec<u32>,
    /// Where the final animation is written.
    pub output_path: PathBuf,
}

/// A single invocation of the underlying video encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePass {
    /// Concat manifest listing frames and durations.
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
    pub bitrate_kbps: u32,
    /// Total animation length, rounded to hundredths of a second.
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// Size window an output must land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTarget {
    pub target_kb: u64,
    pub tolerance_kb: u64,
}

/// Result of a size-constrained encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeOutcome {
    pub output_path: PathBuf,
    pub size_bytes: u64,
    /// Bitrate of the pass that produced the final output.
    pub bitrate_kbps: u32,
    /// Number of encoder invocations.
    pub passes: u32,
    /// Whether the fixed-step fallback ran.
    pub used_fallback: bool,
    /// Output size after each pass, in KB.
    pub size_history_kb: Vec<f64>,
}
