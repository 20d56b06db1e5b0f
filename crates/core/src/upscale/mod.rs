//! Image upscaling backends.
//!
//! [`ResampleUpscaler`] resizes in-process with a Lanczos filter.
//! [`CommandUpscaler`] shells out to an external super-resolution tool
//! (e.g. a waifu2x CLI) that reads and writes PNG files.

mod command;
mod config;
mod error;
mod resample;
mod traits;

use std::sync::Arc;

pub use command::CommandUpscaler;
pub use config::{UpscalerBackend, UpscalerConfig};
pub use error::UpscaleError;
pub use resample::ResampleUpscaler;
pub use traits::Upscaler;

/// Builds the upscaler selected by `config.backend`.
pub fn create_upscaler(config: &UpscalerConfig) -> Arc<dyn Upscaler> {
    match config.backend {
        UpscalerBackend::Resample => Arc::new(ResampleUpscaler::new(config.factor)),
        UpscalerBackend::Command => Arc::new(CommandUpscaler::new(config.clone())),
    }
}
