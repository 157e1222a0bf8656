/// Metrics and telemetry for Profile Seeker
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Lookup outcomes at the gateway
/// - Per-strategy attempts and latencies
/// - Admin login attempts

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Gateway lookups by outcome
    pub static ref LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "profile_lookups_total",
        "Total number of profile lookups",
        &["outcome"]
    )
    .unwrap();

    /// Strategy attempts by strategy and outcome
    pub static ref STRATEGY_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "profile_strategy_attempts_total",
        "Total number of upstream strategy attempts",
        &["strategy", "outcome"]
    )
    .unwrap();

    /// Strategy latency in seconds
    pub static ref STRATEGY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "profile_strategy_duration_seconds",
        "Upstream strategy latencies in seconds",
        &["strategy"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Admin login attempts by result
    pub static ref ADMIN_LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_logins_total",
        "Total number of admin login attempts",
        &["result"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a gateway lookup outcome
pub fn record_lookup(outcome: &str) {
    LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record one strategy attempt
pub fn record_strategy_attempt(strategy: &str, outcome: &str, duration: f64) {
    STRATEGY_ATTEMPTS_TOTAL
        .with_label_values(&[strategy, outcome])
        .inc();
    STRATEGY_DURATION_SECONDS
        .with_label_values(&[strategy])
        .observe(duration);
}

/// Record an admin login attempt
pub fn record_admin_login(success: bool) {
    ADMIN_LOGINS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_strategy_attempt() {
        record_strategy_attempt("api", "timeout", 10.0);
        let metrics = render_metrics();
        assert!(metrics.contains("profile_strategy_attempts_total"));
        assert!(metrics.contains("profile_strategy_duration_seconds"));
    }

    #[test]
    fn test_record_lookup() {
        record_lookup("success");
        record_lookup("unavailable");
        let metrics = render_metrics();
        assert!(metrics.contains("profile_lookups_total"));
        assert!(metrics.contains("outcome=\"unavailable\""));
    }

    #[test]
    fn test_record_admin_login() {
        record_admin_login(false);
        assert!(render_metrics().contains("admin_logins_total"));
    }
}
