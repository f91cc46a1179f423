//! Application state shared across handlers.

use songbook_core::config::AppConfig;
use songbook_metadata::MetadataStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Persistence handle, passed to every handler.
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
        }
    }

    /// Maximum rows returned by a listing endpoint.
    pub fn list_limit(&self) -> u32 {
        self.config.server.list_limit
    }
}
