//! Trait definitions for the encoder module.

use async_trait::async_trait;

use super::error::EncodeError;
use super::types::EncodePass;

/// An encoder that turns a frame manifest into a video at a fixed bitrate.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Runs one encode at the pass's bitrate, overwriting the output.
    async fn encode_pass(&self, pass: &EncodePass) -> Result<(), EncodeError>;

    /// Validates that the encoder is properly configured and ready.
    async fn validate(&self) -> Result<(), EncodeError>;
}
