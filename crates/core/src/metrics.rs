//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Admission (admitted and rejected requests)
//! - Jobs (outcomes and duration)
//! - Encoder (passes, fallbacks)
//! - Still compression (quality iterations)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Admission
// =============================================================================

/// Admission attempts total by outcome.
pub static ADMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stickerforge_admissions_total",
            "Total admission attempts",
        ),
        &["outcome"], // "admitted", "busy", "duplicate", "quota"
    )
    .unwrap()
});

/// Jobs currently holding a slot.
pub static JOBS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("stickerforge_jobs_in_flight", "Jobs currently in flight").unwrap()
});

// =============================================================================
// Jobs
// =============================================================================

/// Jobs finished total by outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stickerforge_jobs_finished_total", "Total jobs finished"),
        &["outcome"], // "done", "failed", "cancelled"
    )
    .unwrap()
});

/// End-to-end job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stickerforge_job_duration_seconds",
            "Duration of a job from admission to completion",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 2700.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Encoder
// =============================================================================

/// Encoder invocations total.
pub static ENCODER_PASSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("stickerforge_encoder_passes_total", "Total encoder passes").unwrap()
});

/// Encodes that needed the fixed-step fallback.
pub static ENCODER_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stickerforge_encoder_fallbacks_total",
        "Total encodes that entered the fallback loop",
    )
    .unwrap()
});

/// Encodes that could not meet the size target.
pub static ENCODER_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stickerforge_encoder_exhausted_total",
        "Total encodes that failed to meet the size target",
    )
    .unwrap()
});

// =============================================================================
// Still compression
// =============================================================================

/// Quality steps taken per compressed still.
pub static STILL_COMPRESSION_STEPS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stickerforge_still_compression_steps",
            "Quality reductions needed to fit a still under budget",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
        &[],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Admission
        Box::new(ADMISSIONS_TOTAL.clone()),
        Box::new(JOBS_IN_FLIGHT.clone()),
        // Jobs
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Encoder
        Box::new(ENCODER_PASSES.clone()),
        Box::new(ENCODER_FALLBACKS.clone()),
        Box::new(ENCODER_EXHAUSTED.clone()),
        // Still compression
        Box::new(STILL_COMPRESSION_STEPS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        ADMISSIONS_TOTAL.with_label_values(&["admitted"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "stickerforge_admissions_total"));
    }
}
