//! Prometheus metrics for the HTTP surface.
//!
//! Request metrics live here; job and encoder metrics are defined in core
//! and registered into the same registry. Admission gauges are refreshed
//! from the live controller on every scrape.

use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

use stickerforge_core::JobPhase;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stickerforge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stickerforge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stickerforge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Admission Metrics (collected dynamically)
// =============================================================================

/// Free concurrency slots.
pub static ADMISSION_SLOTS_AVAILABLE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stickerforge_admission_slots_available",
        "Number of free job slots",
    )
    .unwrap()
});

/// Admitted jobs by phase.
pub static JOBS_BY_PHASE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("stickerforge_jobs_by_phase", "Admitted jobs by phase"),
        &["phase"],
    )
    .unwrap()
});

const LIVE_PHASES: [JobPhase; 5] = [
    JobPhase::Pending,
    JobPhase::Fetching,
    JobPhase::Upscaling,
    JobPhase::Encoding,
    JobPhase::Publishing,
];

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let local: Vec<Box<dyn Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(ADMISSION_SLOTS_AVAILABLE.clone()),
        Box::new(JOBS_BY_PHASE.clone()),
    ];
    // Core metrics: admission outcomes, jobs, encoder and still compression.
    for metric in local
        .into_iter()
        .chain(stickerforge_core::metrics::all_metrics())
    {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges from the admission controller before a scrape.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let admission = state.manager().admission();
    ADMISSION_SLOTS_AVAILABLE.set(admission.available_slots() as i64);
    stickerforge_core::metrics::JOBS_IN_FLIGHT.set(admission.in_flight_count() as i64);

    let jobs = admission.snapshot();
    for phase in LIVE_PHASES {
        let count = jobs.iter().filter(|job| job.phase == phase).count();
        JOBS_BY_PHASE
            .with_label_values(&[phase.as_str()])
            .set(count as i64);
    }
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    // Run twice: adjacent numeric segments share a slash.
    let once = NUMERIC_SEGMENT.replace_all(path, "/{id}$1");
    NUMERIC_SEGMENT.replace_all(&once, "/{id}$1").into_owned()
}
