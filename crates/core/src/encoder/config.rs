//! Configuration for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for size-constrained animation encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Output size ceiling in KB.
    #[serde(default = "default_target_size_kb")]
    pub target_size_kb: u64,

    /// How far under the ceiling an output may land and still be accepted.
    #[serde(default = "default_tolerance_kb")]
    pub tolerance_kb: u64,

    /// Passes of the stepped bitrate search.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Bitrate decrement for each fallback pass.
    #[serde(default = "default_fallback_step_kbps")]
    pub fallback_step_kbps: u32,

    /// Upper bound on fallback passes.
    #[serde(default = "default_max_fallback_iterations")]
    pub max_fallback_iterations: u32,

    /// Duration given to every frame when the source has none.
    #[serde(default = "default_frame_ms")]
    pub default_frame_ms: u32,

    /// Ceiling on the total animation duration.
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u32,

    /// Output width in pixels.
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// Output height in pixels.
    #[serde(default = "default_dimension")]
    pub height: u32,

    /// Video codec passed to `-c:v`.
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Pixel format (keeps the alpha channel).
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Timeout for a single encoder pass in seconds.
    #[serde(default = "default_pass_timeout")]
    pub pass_timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_target_size_kb() -> u64 {
    256
}

fn default_tolerance_kb() -> u64 {
    25
}

fn default_max_attempts() -> u32 {
    5
}

fn default_fallback_step_kbps() -> u32 {
    25
}

fn default_max_fallback_iterations() -> u32 {
    200
}

fn default_frame_ms() -> u32 {
    60
}

fn default_max_duration_ms() -> u32 {
    2999
}

fn default_dimension() -> u32 {
    512
}

fn default_codec() -> String {
    "libvpx-vp9".to_string()
}

fn default_pixel_format() -> String {
    "yuva420p".to_string()
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_pass_timeout() -> u64 {
    600 // 10 minutes
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            target_size_kb: default_target_size_kb(),
            tolerance_kb: default_tolerance_kb(),
            max_attempts: default_max_attempts(),
            fallback_step_kbps: default_fallback_step_kbps(),
            max_fallback_iterations: default_max_fallback_iterations(),
            default_frame_ms: default_frame_ms(),
            max_duration_ms: default_max_duration_ms(),
            width: default_dimension(),
            height: default_dimension(),
            codec: default_codec(),
            pixel_format: default_pixel_format(),
            ffmpeg_log_level: default_log_level(),
            pass_timeout_secs: default_pass_timeout(),
        }
    }
}

impl EncoderConfig {
    /// Sets the ffmpeg binary path.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Sets the size ceiling and tolerance.
    pub fn with_target(mut self, target_size_kb: u64, tolerance_kb: u64) -> Self {
        self.target_size_kb = target_size_kb;
        self.tolerance_kb = tolerance_kb;
        self
    }

    /// Sets the output dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the fallback iteration cap.
    pub fn with_max_fallback_iterations(mut self, max: u32) -> Self {
        self.max_fallback_iterations = max;
        self
    }
}
