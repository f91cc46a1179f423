//! HTTP API server for the songbook backend.
//!
//! This crate provides the JSON endpoints consumed by the music player:
//! - Recently played history (list, add, delete)
//! - Song lists (get one, list by list or across all lists, add, delete)
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
