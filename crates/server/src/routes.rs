//! Route configuration.

use crate::handlers;
use crate::handlers::common::MAX_SONG_BODY_SIZE;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let recently_played = Router::new()
        .route("/getSong", get(handlers::list_recently_played))
        .route("/addSong", post(handlers::add_recently_played))
        .route("/deleteSong", get(handlers::delete_recently_played));

    let song_list = Router::new()
        .route("/getSong", get(handlers::get_song))
        .route("/addSong", post(handlers::add_song))
        .route("/deleteSong", get(handlers::delete_song));

    let mut router = Router::new()
        .nest("/recently_played", recently_played)
        .nest("/song_list", song_list)
        .route("/health", get(handlers::health_check));

    // When enabled, restrict /metrics to the scraper at the network level.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    if state.config.server.cors_allow_any_origin {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(DefaultBodyLimit::max(MAX_SONG_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
