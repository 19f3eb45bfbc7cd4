//! Metrics collection and exposition.
//!
//! # Metrics
//! - `locale_redirect_evaluations_total` (counter): rule evaluations by outcome
//! - `locale_redirect_redirects_total` (counter): redirects by target store
//! - `locale_redirect_config_reloads_total` (counter): reloads by result
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one rule evaluation (`redirect` or `pass`).
pub fn record_evaluation(outcome: &'static str) {
    metrics::counter!("locale_redirect_evaluations_total", "outcome" => outcome).increment(1);
}

/// Record a redirect issued towards `store`.
pub fn record_redirect(store: &str) {
    metrics::counter!("locale_redirect_redirects_total", "store" => store.to_string()).increment(1);
}

/// Record a configuration reload (`applied` or `rejected`).
pub fn record_config_reload(result: &'static str) {
    metrics::counter!("locale_redirect_config_reloads_total", "result" => result).increment(1);
}
