//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{RecentlyPlayedRepo, SongListRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: RecentlyPlayedRepo + SongListRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and bring its schema up to date.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // One connection serialises writers, so the read-then-upsert
            // transactions below never interleave.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "SQLite metadata store opened");

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn table_exists(&self, table: &str) -> MetadataResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn column_exists(&self, table: &str, column: &str) -> MetadataResult<bool> {
        let columns: Vec<(i32, String, String, i32, Option<String>, i32)> =
            sqlx::query_as(&format!("PRAGMA table_info({table})"))
                .fetch_all(&self.pool)
                .await?;
        Ok(columns.iter().any(|(_, name, _, _, _, _)| name == column))
    }

    /// Refuse to build a unique index over a legacy table that already holds
    /// several rows for one identity.
    async fn ensure_unique_identities(&self, table: &str, identity: &str) -> MetadataResult<()> {
        let duplicates: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM (SELECT 1 FROM {table} GROUP BY {identity} HAVING COUNT(*) > 1)"
        ))
        .fetch_one(&self.pool)
        .await?;

        if duplicates > 0 {
            return Err(MetadataError::Internal(format!(
                "Incompatible database contents: table {table} holds {duplicates} identities \
                 ({identity}) with more than one row. Merge or remove the duplicate rows \
                 before starting the server."
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // Databases written by the first schema generation have a
        // recently_played table without the soft-delete flag.
        if self.table_exists("recently_played").await? {
            if !self.column_exists("recently_played", "is_deleted").await? {
                sqlx::query(
                    "ALTER TABLE recently_played ADD COLUMN is_deleted INTEGER NOT NULL DEFAULT 0",
                )
                .execute(&self.pool)
                .await?;
                tracing::info!("Added is_deleted column to legacy recently_played table");
            }
            self.ensure_unique_identities("recently_played", "song_id")
                .await?;
        }

        if self.table_exists("song_item").await? {
            sqlx::query("UPDATE song_item SET is_deleted = 0 WHERE is_deleted IS NULL")
                .execute(&self.pool)
                .await?;
            self.ensure_unique_identities("song_item", "song_id, list_id")
                .await?;
        }

        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;

        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use songbook_core::{ListId, ListSelector, NewSong, SongId};
    use time::macros::format_description;
    use time::{OffsetDateTime, UtcOffset};

    /// SQLite keeps timestamps as text and orders them lexically, so they are
    /// written in UTC with a fixed nine-digit fraction.
    fn stored_time(now: OffsetDateTime) -> MetadataResult<String> {
        now.to_offset(UtcOffset::UTC)
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
            ))
            .map_err(|e| MetadataError::Internal(format!("failed to format timestamp: {e}")))
    }

    #[async_trait]
    impl RecentlyPlayedRepo for SqliteStore {
        async fn list_recently_played(
            &self,
            limit: u32,
        ) -> MetadataResult<Vec<RecentlyPlayedRow>> {
            let rows = sqlx::query_as::<_, RecentlyPlayedRow>(
                r#"
                SELECT * FROM recently_played
                WHERE is_deleted = 0
                ORDER BY update_time DESC, id DESC
                LIMIT ?
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
                "SELECT * FROM recently_played WHERE song_id = ?",
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

            let prior: Option<bool> =
                sqlx::query_scalar("SELECT is_deleted FROM recently_played WHERE song_id = ?")
                    .bind(song.song_id.0)
                    .fetch_optional(&mut *tx)
                    .await?;

            sqlx::query(
                r#"
                INSERT INTO recently_played (
                    song_id, title, singer, singer_id, mark, label, src, "index", lyric,
                    update_time, is_deleted
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
                ON CONFLICT(song_id) DO UPDATE SET
                    update_time = excluded.update_time,
                    is_deleted = 0
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
            .bind(stored_time(now)?)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(UpsertOutcome::from_prior(prior))
        }

        async fn soft_delete_recently_played(
            &self,
            song_id: SongId,
            now: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE recently_played SET is_deleted = 1, update_time = ? WHERE song_id = ? AND is_deleted = 0",
            )
            .bind(stored_time(now)?)
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
    impl SongListRepo for SqliteStore {
        async fn get_song_item(&self, song_id: SongId) -> MetadataResult<Option<SongItemRow>> {
            let row = sqlx::query_as::<_, SongItemRow>(
                r#"
                SELECT * FROM song_item
                WHERE song_id = ? AND is_deleted = 0
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
                "SELECT * FROM song_item WHERE song_id = ? AND list_id = ?",
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
                        WHERE is_deleted = 0
                        ORDER BY update_time DESC, id DESC
                        LIMIT ?
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
                        WHERE list_id = ? AND is_deleted = 0
                        ORDER BY update_time DESC, id DESC
                        LIMIT ?
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
                "SELECT is_deleted FROM song_item WHERE song_id = ? AND list_id = ?",
            )
            .bind(song.song_id.0)
            .bind(list_id.0)
            .fetch_optional(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO song_item (
                    song_id, title, singer, singer_id, mark, label, src, "index", lyric,
                    update_time, is_deleted, list_id
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
                ON CONFLICT(song_id, list_id) DO UPDATE SET
                    update_time = excluded.update_time,
                    is_deleted = 0
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
            .bind(stored_time(now)?)
            .bind(list_id.0)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(UpsertOutcome::from_prior(prior))
        }

        async fn soft_delete_song_item(
            &self,
            song_id: SongId,
            list_id: ListId,
            now: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                r#"
                UPDATE song_item SET is_deleted = 1, update_time = ?
                WHERE song_id = ? AND list_id = ? AND is_deleted = 0
                "#,
            )
            .bind(stored_time(now)?)
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
}

/// SQLite schema. Statements are idempotent and run on every start.
const SCHEMA_SQL: &str = r#"
-- Global play history: one row per song
CREATE TABLE IF NOT EXISTS recently_played (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    song_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    singer TEXT,
    singer_id TEXT,
    mark TEXT,
    label TEXT,
    src TEXT NOT NULL,
    "index" INTEGER,
    lyric TEXT,
    update_time TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_recently_played_song ON recently_played(song_id);
CREATE INDEX IF NOT EXISTS idx_recently_played_active ON recently_played(is_deleted, update_time);

-- Song list membership: one row per (song, list) pair
CREATE TABLE IF NOT EXISTS song_item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    song_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    singer TEXT,
    singer_id TEXT,
    mark TEXT,
    label TEXT,
    src TEXT NOT NULL,
    "index" INTEGER,
    lyric TEXT,
    update_time TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    list_id INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_song_item_identity ON song_item(song_id, list_id);
CREATE INDEX IF NOT EXISTS idx_song_item_list ON song_item(list_id, is_deleted, update_time);
CREATE INDEX IF NOT EXISTS idx_song_item_active ON song_item(is_deleted, update_time);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use songbook_core::{NewSong, SongId};
    use time::OffsetDateTime;

    fn song(id: i64) -> NewSong {
        NewSong {
            song_id: SongId(id),
            title: format!("Song {id}"),
            singer: "Singer".to_string(),
            singer_id: None,
            mark: None,
            label: None,
            src: format!("https://example.com/{id}.mp3"),
            index: None,
            lyric: None,
        }
    }

    #[tokio::test]
    async fn test_new_creates_database_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("instance").join("music_player.db");

        let store = SqliteStore::new(&db_path).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("songs.db"))
            .await
            .unwrap();

        store
            .upsert_recently_played(&song(1), OffsetDateTime::now_utc())
            .await
            .unwrap();
        store.migrate().await.unwrap();

        let rows = store.list_recently_played(20).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_migrate_adds_soft_delete_flag_to_legacy_table() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("legacy.db");

        {
            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path.display()))
                .unwrap()
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new().connect_with(opts).await.unwrap();
            sqlx::query(
                r#"
                CREATE TABLE recently_played (
                    id INTEGER PRIMARY KEY,
                    song_id INTEGER NOT NULL,
                    title VARCHAR(255) NOT NULL,
                    singer VARCHAR(255),
                    singer_id VARCHAR(255),
                    mark VARCHAR(255),
                    label VARCHAR(255),
                    src VARCHAR(255),
                    "index" INTEGER,
                    lyric VARCHAR(255),
                    update_time DATETIME
                );
                INSERT INTO recently_played (song_id, title, singer, src, update_time)
                VALUES (9, 'Old', 'Someone', 'u9', '2024-01-01 08:00:00.000000');
                "#,
            )
            .execute(&pool)
            .await
            .unwrap();
            pool.close().await;
        }

        let store = SqliteStore::new(&db_path).await.unwrap();
        let row = store
            .get_recently_played(SongId(9))
            .await
            .unwrap()
            .expect("legacy row survives migration");
        assert!(!row.is_deleted);
        assert_eq!(row.title, "Old");
    }

    #[tokio::test]
    async fn test_migrate_rejects_legacy_duplicates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("dupes.db");

        {
            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path.display()))
                .unwrap()
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new().connect_with(opts).await.unwrap();
            sqlx::query(
                r#"
                CREATE TABLE recently_played (
                    id INTEGER PRIMARY KEY,
                    song_id INTEGER NOT NULL,
                    title VARCHAR(255) NOT NULL,
                    src VARCHAR(255),
                    update_time DATETIME
                );
                INSERT INTO recently_played (song_id, title, src) VALUES (3, 'A', 'u3');
                INSERT INTO recently_played (song_id, title, src) VALUES (3, 'A', 'u3');
                "#,
            )
            .execute(&pool)
            .await
            .unwrap();
            pool.close().await;
        }

        match SqliteStore::new(&db_path).await {
            Err(MetadataError::Internal(msg)) => assert!(msg.contains("recently_played")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("duplicate identities must be rejected"),
        }
    }
}
