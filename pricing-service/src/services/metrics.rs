//! Metrics module for pricing-service.
//! Provides Prometheus metrics for price calculations, alterations and collaborator fetches.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Collaborator fetch duration histogram
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "pricing_fetch_duration_seconds",
            "Catalog, inventory and usage fetch duration"
        ),
        &["service"]
    )
    .expect("Failed to register FETCH_DURATION")
});

/// Calculations counter by plan shape and outcome
pub static CALCULATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Calculation duration histogram
pub static CALCULATION_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Applied alterations counter
pub static ALTERATIONS_APPLIED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    CALCULATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "pricing_calculations_total",
                "Total price calculations by plan shape and status"
            ),
            &["shape", "status"]
        )
        .expect("Failed to register CALCULATIONS_TOTAL")
    });

    // Calculations are in-memory once inputs are fetched; buckets skew small
    CALCULATION_DURATION.get_or_init(|| {
        register_histogram_vec!(
            histogram_opts!(
                "pricing_calculation_duration_seconds",
                "Price calculation duration",
                vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
            ),
            &["operation"]
        )
        .expect("Failed to register CALCULATION_DURATION")
    });

    ALTERATIONS_APPLIED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "pricing_alterations_applied_total",
                "Total alterations applied by kind"
            ),
            &["kind"]
        )
        .expect("Failed to register ALTERATIONS_APPLIED_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("pricing_errors_total", "Total errors by kind for alerting"),
            &["kind", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*FETCH_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record a finished calculation.
pub fn record_calculation(shape: &str, status: &str) {
    if let Some(counter) = CALCULATIONS_TOTAL.get() {
        counter.with_label_values(&[shape, status]).inc();
    }
}

/// Record calculation duration.
pub fn record_calculation_duration(operation: &str, duration_secs: f64) {
    if let Some(histogram) = CALCULATION_DURATION.get() {
        histogram
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

/// Record an applied alteration.
pub fn record_alteration_applied(kind: &str) {
    if let Some(counter) = ALTERATIONS_APPLIED_TOTAL.get() {
        counter.with_label_values(&[kind]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(kind: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[kind, operation]).inc();
    }
}

/// Record a collaborator fetch duration.
pub fn record_fetch_duration(service: &str, duration_secs: f64) {
    FETCH_DURATION
        .with_label_values(&[service])
        .observe(duration_secs);
}
