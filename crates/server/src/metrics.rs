//! Prometheus metrics for the songbook server.
//!
//! The `/metrics` endpoint is unauthenticated. Counters carry only the store
//! name, upsert outcome and error kind, never song or list ids.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{self, Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use songbook_metadata::UpsertOutcome;
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static SONG_UPSERTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "songbook_song_upserts_total",
            "Total song upserts by store and outcome",
        ),
        &["store", "outcome"],
    )
    .expect("metric creation failed")
});

pub static SONG_SOFT_DELETES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "songbook_song_soft_deletes_total",
            "Total songs soft-deleted by store",
        ),
        &["store"],
    )
    .expect("metric creation failed")
});

pub static REQUEST_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "songbook_request_errors_total",
            "Total failed requests by error kind",
        ),
        &["kind"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests that build several routers can call it freely.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(SONG_UPSERTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SONG_SOFT_DELETES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(REQUEST_ERRORS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

pub fn record_upsert(store: &str, outcome: UpsertOutcome) {
    SONG_UPSERTS
        .with_label_values(&[store, outcome.as_str()])
        .inc();
}

pub fn record_soft_delete(store: &str) {
    SONG_SOFT_DELETES.with_label_values(&[store]).inc();
}

pub fn record_request_error(kind: &str) {
    REQUEST_ERRORS.with_label_values(&[kind]).inc();
}
