//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:21600").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum number of songs returned by a listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Answer cross-origin requests from any origin (default: true).
    /// The player frontend is usually served from a different origin.
    #[serde(default = "default_cors_allow_any_origin")]
    pub cors_allow_any_origin: bool,
}

fn default_bind() -> String {
    "0.0.0.0:21600".to_string()
}

fn default_list_limit() -> u32 {
    crate::DEFAULT_LIST_LIMIT
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_cors_allow_any_origin() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            list_limit: default_list_limit(),
            metrics_enabled: default_metrics_enabled(),
            cors_allow_any_origin: default_cors_allow_any_origin(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.list_limit == 0 || self.list_limit > crate::MAX_LIST_LIMIT {
            return Err(format!(
                "server.list_limit must be between 1 and {}, got {}",
                crate::MAX_LIST_LIMIT,
                self.list_limit
            ));
        }
        Ok(())
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host (e.g., "localhost" or "db.example.com").
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer SONGBOOK_METADATA__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds.
        #[serde(default)]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./instance/music_player.db"),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                max_connections,
                ..
            } => {
                if *max_connections == 0 {
                    return Err("postgres max_connections must be at least 1".to_string());
                }
                // Must have either url OR (host + database)
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) => Ok(()),
                    (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(
                        "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                    ),
                    (None, Some(_), None) => Err(
                        "postgres config requires 'database' when using individual fields"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Validate every section, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.metadata.validate()
    }

    /// Create a test configuration backed by the given SQLite file.
    ///
    /// **For testing only.**
    pub fn for_testing(db_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::Sqlite {
                path: db_path.into(),
            },
        }
    }
}
