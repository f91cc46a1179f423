//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::*;
use crate::repos::{RecentlyPlayedRepo, SongListRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use songbook_core::config::PgSslMode;
use songbook_core::{ListId, ListSelector, NewSong, SongId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, enabling better
    /// secret management (e.g., passwords via environment variables).
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecentlyPlayedRepo for PostgresStore {
    async fn list_recently_played(&self, limit: u32) -> MetadataResult<Vec<RecentlyPlayedRow>> {
        let rows = sqlx::query_as::<_, RecentlyPlayedRow>(
            r#"
            SELECT * FROM recently_played
            WHERE is_deleted = FALSE
            ORDER BY update_time DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_recently_played(
        &self,
        song_id: SongId,
    ) -> MetadataResult<Option<RecentlyPlayedRow>> {
        let row = sqlx::query_as::<_, RecentlyPlayedRow>(
            "SELECT * FROM recently_played WHERE song_id = $1",
        )
        .bind(song_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_recently_played(
        &self,
        song: &NewSong,
        now: OffsetDateTime,
    ) -> MetadataResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        // Locks an existing row so a restore is told apart from a refresh.
        // An absent row cannot be locked; `inserted` below covers that case.
        let prior: Option<bool> = sqlx::query_scalar(
            "SELECT is_deleted FROM recently_played WHERE song_id = $1 FOR UPDATE",
        )
        .bind(song.song_id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO recently_played (
                song_id, title, singer, singer_id, mark, label, src, "index", lyric,
                update_time, is_deleted
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            ON CONFLICT(song_id) DO UPDATE SET
                update_time = EXCLUDED.update_time,
                is_deleted = FALSE
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(song.song_id.0)
        .bind(&song.title)
        .bind(&song.singer)
        .bind(&song.singer_id)
        .bind(&song.mark)
        .bind(&song.label)
        .bind(&song.src)
        .bind(song.index)
        .bind(&song.lyric)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UpsertOutcome::from_write(inserted, prior))
    }

    async fn soft_delete_recently_played(
        &self,
        song_id: SongId,
        now: OffsetDateTime,
    ) -> MetadataResult<()> {
        let result = sqlx::query(
            "UPDATE recently_played SET is_deleted = TRUE, update_time = $1 WHERE song_id = $2 AND is_deleted = FALSE",
        )
        .bind(now)
        .bind(song_id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "recently played song {song_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SongListRepo for PostgresStore {
    async fn get_song_item(&self, song_id: SongId) -> MetadataResult<Option<SongItemRow>> {
        let row = sqlx::query_as::<_, SongItemRow>(
            r#"
            SELECT * FROM song_item
            WHERE song_id = $1 AND is_deleted = FALSE
            ORDER BY update_time DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(song_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_song_item(
        &self,
        song_id: SongId,
        list_id: ListId,
    ) -> MetadataResult<Option<SongItemRow>> {
        let row = sqlx::query_as::<_, SongItemRow>(
            "SELECT * FROM song_item WHERE song_id = $1 AND list_id = $2",
        )
        .bind(song_id.0)
        .bind(list_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_song_items(
        &self,
        selector: ListSelector,
        limit: u32,
    ) -> MetadataResult<Vec<SongItemRow>> {
        let rows = match selector {
            ListSelector::All => {
                sqlx::query_as::<_, SongItemRow>(
                    r#"
                    SELECT * FROM song_item
                    WHERE is_deleted = FALSE
                    ORDER BY update_time DESC, id DESC
                    LIMIT $1
                    "#,
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            ListSelector::List(list_id) => {
                sqlx::query_as::<_, SongItemRow>(
                    r#"
                    SELECT * FROM song_item
                    WHERE list_id = $1 AND is_deleted = FALSE
                    ORDER BY update_time DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(list_id.0)
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn upsert_song_item(
        &self,
        list_id: ListId,
        song: &NewSong,
        now: OffsetDateTime,
    ) -> MetadataResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let prior: Option<bool> = sqlx::query_scalar(
            "SELECT is_deleted FROM song_item WHERE song_id = $1 AND list_id = $2 FOR UPDATE",
        )
        .bind(song.song_id.0)
        .bind(list_id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO song_item (
                song_id, title, singer, singer_id, mark, label, src, "index", lyric,
                update_time, is_deleted, list_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11)
            ON CONFLICT(song_id, list_id) DO UPDATE SET
                update_time = EXCLUDED.update_time,
                is_deleted = FALSE
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(song.song_id.0)
        .bind(&song.title)
        .bind(&song.singer)
        .bind(&song.singer_id)
        .bind(&song.mark)
        .bind(&song.label)
        .bind(&song.src)
        .bind(song.index)
        .bind(&song.lyric)
        .bind(now)
        .bind(list_id.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UpsertOutcome::from_write(inserted, prior))
    }

    async fn soft_delete_song_item(
        &self,
        song_id: SongId,
        list_id: ListId,
        now: OffsetDateTime,
    ) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE song_item SET is_deleted = TRUE, update_time = $1
            WHERE song_id = $2 AND list_id = $3 AND is_deleted = FALSE
            "#,
        )
        .bind(now)
        .bind(song_id.0)
        .bind(list_id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "song {song_id} in list {list_id}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_skip_comments() {
        let statements = postgres_schema_statements(POSTGRES_SCHEMA);
        assert!(
            statements
                .iter()
                .all(|s| !s.lines().all(|l| l.trim().starts_with("--")))
        );
        assert!(
            statements
                .iter()
                .any(|s| s.contains("CREATE TABLE IF NOT EXISTS song_item"))
        );
    }
}
