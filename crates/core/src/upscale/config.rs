use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Available upscaling backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpscalerBackend {
    /// In-process Lanczos resampling.
    #[default]
    Resample,
    /// External command reading `-i <in.png>` and writing `-o <out.png>`.
    Command,
}

/// Upscaler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpscalerConfig {
    #[serde(default)]
    pub backend: UpscalerBackend,

    /// Scale factor applied to both dimensions.
    #[serde(default = "default_factor")]
    pub factor: u32,

    /// External binary for the command backend.
    #[serde(default = "default_command")]
    pub command: PathBuf,

    /// Extra arguments passed after `-i`/`-o`.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Scratch directory for command input/output files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Timeout for one external invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_factor() -> u32 {
    2
}

fn default_command() -> PathBuf {
    PathBuf::from("waifu2x-ncnn-vulkan")
}

fn default_args() -> Vec<String> {
    vec![
        "-n".to_string(),
        "1".to_string(),
        "-s".to_string(),
        "2".to_string(),
    ]
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("stickerforge-upscale")
}

fn default_timeout() -> u64 {
    120
}

impl Default for UpscalerConfig {
    fn default() -> Self {
        Self {
            backend: UpscalerBackend::default(),
            factor: default_factor(),
            command: default_command(),
            args: default_args(),
            work_dir: default_work_dir(),
            timeout_secs: default_timeout(),
        }
    }
}
