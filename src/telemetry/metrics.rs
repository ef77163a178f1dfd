//! Prometheus recorder and metric descriptions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Histogram buckets in seconds, tuned for sub-second API calls
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)
        .context("invalid histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Describe every metric and touch the counters so `/metrics` lists them
/// from startup.
pub fn describe_metrics() {
    describe_counter!("hotelhub_http_requests_total", "HTTP requests by route and status");
    describe_histogram!(
        "hotelhub_http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    describe_gauge!(
        "hotelhub_http_requests_in_flight",
        "HTTP requests currently being served"
    );

    describe_counter!("hotelhub_hotels_created_total", "Hotels submitted for approval");
    describe_counter!(
        "hotelhub_hotel_status_changes_total",
        "Hotel approval status changes by target status"
    );
    describe_counter!("hotelhub_bookings_created_total", "Bookings placed");
    describe_counter!(
        "hotelhub_booking_transitions_total",
        "Booking status changes by target status"
    );
    describe_counter!("hotelhub_users_registered_total", "Accounts created by role");
    describe_counter!("hotelhub_login_failures_total", "Rejected password logins");
    describe_counter!(
        "hotelhub_verification_codes_sent_total",
        "Phone verification codes issued"
    );

    counter!("hotelhub_hotels_created_total").absolute(0);
    counter!("hotelhub_bookings_created_total").absolute(0);
    counter!("hotelhub_login_failures_total").absolute(0);
    counter!("hotelhub_verification_codes_sent_total").absolute(0);
    gauge!("hotelhub_http_requests_in_flight").set(0.0);
}
