use super::{types::Config, ConfigError};
use crate::upscale::UpscalerBackend;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Concurrency limits and worker counts are not 0
/// - Encoder tolerance is below the size target
/// - Still-compression quality range is usable
/// - Telegram bot token is present
/// - Command upscaler has a command
/// - Session timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.admission.max_concurrent_jobs == 0 {
        return Err(invalid("admission.max_concurrent_jobs cannot be 0"));
    }

    if config.runner.upscale_workers == 0 {
        return Err(invalid("runner.upscale_workers cannot be 0"));
    }
    if config.runner.fetch_attempts == 0 {
        return Err(invalid("runner.fetch_attempts cannot be 0"));
    }
    if config.runner.canvas_size == 0 {
        return Err(invalid("runner.canvas_size cannot be 0"));
    }

    let compression = &config.runner.compression;
    if compression.quality_step == 0
        || compression.quality_floor == 0
        || compression.quality_start > 100
        || compression.quality_floor > compression.quality_start
    {
        return Err(invalid(
            "runner.compression requires 0 < quality_floor <= quality_start <= 100 and quality_step > 0",
        ));
    }

    let encoder = &config.encoder;
    if encoder.target_size_kb == 0 {
        return Err(invalid("encoder.target_size_kb cannot be 0"));
    }
    if encoder.tolerance_kb >= encoder.target_size_kb {
        return Err(invalid(format!(
            "encoder.tolerance_kb ({}) must be below encoder.target_size_kb ({})",
            encoder.tolerance_kb, encoder.target_size_kb
        )));
    }
    if encoder.max_attempts == 0 {
        return Err(invalid("encoder.max_attempts cannot be 0"));
    }
    if encoder.fallback_step_kbps == 0 {
        return Err(invalid("encoder.fallback_step_kbps cannot be 0"));
    }
    if encoder.max_duration_ms == 0 || encoder.default_frame_ms == 0 {
        return Err(invalid(
            "encoder.max_duration_ms and encoder.default_frame_ms cannot be 0",
        ));
    }

    if !(0.0..=1.0).contains(&config.resolver.changed_ratio_threshold) {
        return Err(invalid(
            "resolver.changed_ratio_threshold must be between 0 and 1",
        ));
    }

    if config.upscaler.factor == 0 {
        return Err(invalid("upscaler.factor cannot be 0"));
    }
    if config.upscaler.backend == UpscalerBackend::Command
        && config.upscaler.command.as_os_str().is_empty()
    {
        return Err(invalid("upscaler.command is required for the command backend"));
    }

    if config.telegram.bot_token.trim().is_empty() {
        return Err(invalid("telegram.bot_token cannot be empty"));
    }
    if config.telegram.sticker_tag.trim().is_empty() {
        return Err(invalid("telegram.sticker_tag cannot be empty"));
    }

    if config.session.confirmation_timeout_secs == 0
        || config.session.merge_indices_timeout_secs == 0
    {
        return Err(invalid("session timeouts cannot be 0"));
    }

    Ok(())
}
