//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the /metrics endpoint handler.
//! Billing counters are recorded through the helpers below; without an
//! installed recorder they are no-ops.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Call once at startup, before any metrics are recorded. A second call
/// leaves the first recorder in place.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_invoices_generated(hostel_id: &str, created: u64) {
    counter!("invoices_generated_total", "hostel_id" => hostel_id.to_string()).increment(created);
}

pub fn record_generation_rejected(hostel_id: &str) {
    counter!("invoice_generation_rejected_total", "hostel_id" => hostel_id.to_string())
        .increment(1);
}

pub fn record_payment_transition(to: &'static str) {
    counter!("payment_transitions_total", "to" => to).increment(1);
    if to == "COMPLETED" {
        counter!("payments_verified_total").increment(1);
    }
}
