//! Bitrate search that keeps encoded output under a size ceiling.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::EncoderConfig;
use super::durations::normalize_durations;
use super::error::EncodeError;
use super::manifest::write_manifest;
use super::traits::VideoEncoder;
use super::types::{EncodeOutcome, EncodePass, EncodeRequest, SizeTarget};
use crate::metrics;

/// First bitrate to try: the rate that would fill the target exactly.
pub fn initial_bitrate(target_kb: u64, duration_secs: f64) -> u32 {
    let secs = duration_secs.max(0.01);
    ((target_kb as f64 * 8.0) / secs).floor().max(1.0) as u32
}

/// Bitrate correction for an output of `size_kb`. Zero means accept.
///
/// Outputs are accepted when they land at most `tolerance_kb` under the
/// target. Otherwise the step grows with the error: 150 kbps beyond 100 KB,
/// 100 beyond 50 KB, 50 beyond 25 KB, else 25. Oversized outputs step down,
/// undersized ones step up.
pub fn bitrate_adjustment(size_kb: f64, target: SizeTarget) -> i64 {
    let diff = size_kb - target.target_kb as f64;
    if diff <= 0.0 && diff.abs() <= target.tolerance_kb as f64 {
        return 0;
    }

    let err = diff.abs();
    let step = if err > 100.0 {
        150
    } else if err > 50.0 {
        100
    } else if err > 25.0 {
        50
    } else {
        25
    };

    if diff > 0.0 {
        -step
    } else {
        step
    }
}

fn apply_adjustment(bitrate: u32, adjustment: i64) -> u32 {
    (i64::from(bitrate) + adjustment).max(1) as u32
}

fn to_kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Drives a [`VideoEncoder`] until its output fits the configured budget.
pub struct SizeConstrainedEncoder {
    encoder: Arc<dyn VideoEncoder>,
    config: EncoderConfig,
}

impl SizeConstrainedEncoder {
    pub fn new(encoder: Arc<dyn VideoEncoder>, config: EncoderConfig) -> Self {
        Self { encoder, config }
    }

    pub fn target(&self) -> SizeTarget {
        SizeTarget {
            target_kb: self.config.target_size_kb,
            tolerance_kb: self.config.tolerance_kb,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encoder(&self) -> &Arc<dyn VideoEncoder> {
        &self.encoder
    }

    /// Encodes the frames in `request.frames_dir` under the size target.
    ///
    /// Runs up to `max_attempts` passes of a stepped bitrate search. If none
    /// lands in the accepted window and the last output is still oversized,
    /// lowers the bitrate by a fixed step per pass until it fits. Fails with
    /// [`EncodeError::BudgetExhausted`] if the fallback hits its iteration
    /// cap or an output at 1 kbps is still too large.
    pub async fn encode(&self, request: &EncodeRequest) -> Result<EncodeOutcome, EncodeError> {
        if request.durations_ms.is_empty() {
            return Err(EncodeError::NoFrames);
        }

        let durations = normalize_durations(
            &request.durations_ms,
            self.config.default_frame_ms,
            self.config.max_duration_ms,
        );
        let (manifest_path, duration_secs) =
            write_manifest(&request.frames_dir, &durations).await?;

        let target = self.target();
        let mut bitrate = initial_bitrate(target.target_kb, duration_secs);
        let mut last_bitrate = bitrate;
        let mut size_bytes = 0;
        let mut passes = 0;
        let mut history = Vec::new();

        for attempt in 1..=self.config.max_attempts {
            size_bytes = self
                .run_pass(&manifest_path, request, bitrate, duration_secs)
                .await?;
            passes += 1;
            last_bitrate = bitrate;
            history.push(to_kb(size_bytes));

            let adjustment = bitrate_adjustment(to_kb(size_bytes), target);
            debug!(
                attempt,
                bitrate_kbps = bitrate,
                size_kb = to_kb(size_bytes),
                adjustment,
                "Encoder pass finished"
            );
            if adjustment == 0 {
                return Ok(self.outcome(request, size_bytes, bitrate, passes, false, history));
            }
            bitrate = apply_adjustment(bitrate, adjustment);
        }

        let mut used_fallback = false;
        let mut iterations = 0;
        while to_kb(size_bytes) > target.target_kb as f64 {
            if iterations >= self.config.max_fallback_iterations || last_bitrate == 1 {
                metrics::ENCODER_EXHAUSTED.inc();
                warn!(
                    output = %request.output_path.display(),
                    passes,
                    bitrate_kbps = last_bitrate,
                    size_kb = to_kb(size_bytes),
                    "Encoder could not meet size target"
                );
                return Err(EncodeError::BudgetExhausted {
                    target_kb: target.target_kb,
                    passes,
                    last_size_kb: to_kb(size_bytes),
                    bitrate_kbps: last_bitrate,
                });
            }
            if !used_fallback {
                used_fallback = true;
                metrics::ENCODER_FALLBACKS.inc();
            }

            bitrate = bitrate
                .saturating_sub(self.config.fallback_step_kbps)
                .max(1);
            size_bytes = self
                .run_pass(&manifest_path, request, bitrate, duration_secs)
                .await?;
            passes += 1;
            iterations += 1;
            last_bitrate = bitrate;
            history.push(to_kb(size_bytes));
        }

        Ok(self.outcome(request, size_bytes, last_bitrate, passes, used_fallback, history))
    }

    async fn run_pass(
        &self,
        manifest_path: &Path,
        request: &EncodeRequest,
        bitrate_kbps: u32,
        duration_secs: f64,
    ) -> Result<u64, EncodeError> {
        let pass = EncodePass {
            manifest_path: manifest_path.to_path_buf(),
            output_path: request.output_path.clone(),
            bitrate_kbps,
            duration_secs,
            width: self.config.width,
            height: self.config.height,
        };
        self.encoder.encode_pass(&pass).await?;
        metrics::ENCODER_PASSES.inc();

        let meta = tokio::fs::metadata(&request.output_path)
            .await
            .map_err(|_| EncodeError::OutputMissing {
                path: request.output_path.clone(),
            })?;
        Ok(meta.len())
    }

    fn outcome(
        &self,
        request: &EncodeRequest,
        size_bytes: u64,
        bitrate_kbps: u32,
        passes: u32,
        used_fallback: bool,
        size_history_kb: Vec<f64>,
    ) -> EncodeOutcome {
        info!(
            output = %request.output_path.display(),
            size_kb = to_kb(size_bytes),
            bitrate_kbps,
            passes,
            used_fallback,
            "Animation encoded"
        );
        EncodeOutcome {
            output_path: request.output_path.clone(),
            size_bytes,
            bitrate_kbps,
            passes,
            used_fallback,
            size_history_kb,
        }
    }
}
