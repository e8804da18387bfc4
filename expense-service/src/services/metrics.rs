//! Prometheus metrics for expense-service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

/// Recorder for the HTTP metrics emitted by the shared middleware.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Submission counter by outcome (created, discarded or an error kind).
pub static SUBMISSIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_submissions_total",
        "Total number of expense request submissions by outcome",
        &["outcome"]
    )
    .expect("Failed to register submissions_total")
});

/// Quote counter by claim type and whether an amount was payable.
pub static QUOTES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_quotes_total",
        "Total number of amount quotes by claim type and result",
        &["claim_type", "result"] // computed, not_applicable, pass_through
    )
    .expect("Failed to register quotes_total")
});

/// Sum of persisted amounts by claim type.
pub static REQUEST_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_request_amount_total",
        "Total amount of persisted expense requests by claim type",
        &["claim_type"]
    )
    .expect("Failed to register request_amount_total")
});

/// Recipient lookups by result.
pub static RECIPIENT_LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_recipient_lookups_total",
        "Total number of recipient code lookups by result",
        &["result"]
    )
    .expect("Failed to register recipient_lookups_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "expense_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
///
/// The HTTP recorder is installed once per process; later calls only touch
/// the statics.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
        }
    }

    Lazy::force(&SUBMISSIONS_TOTAL);
    Lazy::force(&QUOTES_TOTAL);
    Lazy::force(&REQUEST_AMOUNT_TOTAL);
    Lazy::force(&RECIPIENT_LOOKUPS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    if let Ok(custom_metrics) = encoder.encode_to_string(&metric_families) {
        output.push_str(&custom_metrics);
    }

    output
}
