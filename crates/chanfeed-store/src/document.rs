//! SQLite-backed document store.
//!
//! One `posts` table keyed by composite id. The batch upsert runs inside a
//! single transaction so a failed write leaves the collection untouched and
//! the snapshot step never sees a half-applied run.

use async_trait::async_trait;
use chanfeed_core::{error::FeedError, post::Post, traits::PostStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS posts (
    id    TEXT PRIMARY KEY,
    date  TEXT NOT NULL,
    text  TEXT NOT NULL DEFAULT '',
    image TEXT
);";

/// Document store backed by SQLite.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub async fn new(db_path: &str) -> Result<Self, FeedError> {
        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(db_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| FeedError::Store(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| FeedError::Store(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| FeedError::Store(format!("failed to connect to sqlite: {e}")))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| FeedError::Store(format!("failed to ensure schema: {e}")))?;

        info!("document store ready at {db_path}");
        Ok(Self { pool })
    }
}

#[async_trait]
impl PostStore for DocumentStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load_existing(&self) -> Result<HashMap<String, Post>, FeedError> {
        let rows: Vec<(String, String, String, Option<String>)> =
            sqlx::query_as("SELECT id, date, text, image FROM posts")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| FeedError::Store(format!("failed to read posts: {e}")))?;

        let mut index = HashMap::with_capacity(rows.len());
        for (id, date, text, image) in rows {
            if id.trim().is_empty() {
                warn!("skipping stored post with empty id (date {date})");
                continue;
            }
            index.insert(
                id.clone(),
                Post {
                    id,
                    date,
                    text,
                    image,
                },
            );
        }
        Ok(index)
    }

    async fn upsert_batch(&self, posts: &[Post]) -> Result<(), FeedError> {
        if posts.is_empty() {
            return Ok(());
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| FeedError::Store(format!("failed to begin batch: {e}")))?;

        for post in posts {
            sqlx::query(
                "INSERT INTO posts (id, date, text, image) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     date = excluded.date,
                     text = excluded.text,
                     image = excluded.image",
            )
            .bind(&post.id)
            .bind(&post.date)
            .bind(&post.text)
            .bind(&post.image)
            .execute(&mut *tx)
            .await
            .map_err(|e| FeedError::Store(format!("failed to upsert {}: {e}", post.id)))?;
        }

        tx.commit()
            .await
            .map_err(|e| FeedError::Store(format!("failed to commit batch: {e}")))?;
        Ok(())
    }

    async fn load_all_sorted(&self) -> Result<Vec<Post>, FeedError> {
        let rows: Vec<(String, String, String, Option<String>)> =
            sqlx::query_as("SELECT id, date, text, image FROM posts ORDER BY id DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| FeedError::Store(format!("failed to read posts: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, date, text, image)| Post {
                id,
                date,
                text,
                image,
            })
            .collect())
    }
}
