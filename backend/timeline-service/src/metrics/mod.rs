//! Prometheus metrics for timeline-service.
//!
//! Exposes feed-cache and push-channel collectors and an HTTP handler for
//! the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    /// Feed cache read events (hit/miss/error).
    pub static ref FEED_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "feed_cache_events_total",
        "Feed cache read events segmented by outcome",
        &["event"]
    )
    .expect("failed to register feed_cache_events_total");

    /// Feed cache write results (success/error).
    pub static ref FEED_CACHE_WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_cache_write_total",
        "Feed cache write attempts segmented by outcome",
        &["result"]
    )
    .expect("failed to register feed_cache_write_total");

    /// Feed cache invalidations by write-path trigger (create/update/delete).
    pub static ref FEED_CACHE_INVALIDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_cache_invalidations_total",
        "Feed cache invalidations segmented by trigger",
        &["trigger"]
    )
    .expect("failed to register feed_cache_invalidations_total");

    /// Currently open push connections.
    pub static ref PUSH_CONNECTIONS: IntGauge = register_int_gauge!(
        "push_connections",
        "Currently registered push connections"
    )
    .expect("failed to register push_connections");

    /// Push deliveries segmented by kind (new_post/relay).
    pub static ref PUSH_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "push_events_total",
        "Push channel broadcasts segmented by kind",
        &["kind"]
    )
    .expect("failed to register push_events_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
