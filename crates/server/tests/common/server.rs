//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use songbook_core::config::AppConfig;
use songbook_metadata::{MetadataStore, SqliteStore};
use songbook_server::{AppState, create_router};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    sqlite: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server on a temporary SQLite database.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("music_player.db");

        let sqlite = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );
        let metadata: Arc<dyn MetadataStore> = sqlite.clone();

        let mut config = AppConfig::for_testing(&db_path);
        modifier(&mut config);

        let state = AppState::new(config, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            sqlite,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// SQLite pool for raw row counts.
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite.pool()
    }

    /// Send a request and decode the JSON body (Null when empty or not JSON).
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Send a prebuilt request.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    /// Physical rows in `table` matching `song_id`, deleted ones included.
    pub async fn count_rows(&self, table: &str, song_id: i64) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE song_id = ?");
        sqlx::query_scalar(&sql)
            .bind(song_id)
            .fetch_one(self.pool())
            .await
            .expect("count rows")
    }
}
