//! # Record Store Module
//!
//! Persistence for video records behind the [`RecordStore`] trait. Every
//! operation is a single atomic store call; nothing spans more than one.
//!
//! - [`PgRecordStore`]: PostgreSQL through a shared `sqlx` pool
//! - [`MemoryRecordStore`]: in-process store for tests and database-less runs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::video_model::{NewVideo, VideoRecord};

/// Record store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Capabilities the bot needs from the document collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record and return its assigned identifier
    async fn insert(&self, video: NewVideo) -> Result<Uuid, StoreError>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<VideoRecord>, StoreError>;

    /// Total number of records
    async fn count(&self) -> Result<u64, StoreError>;

    /// Delete every record, returning how many were removed
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Delete the oldest record titled exactly like record `id`
    ///
    /// Returns `None` once `id` is gone, even if other records share its title.
    async fn delete_first_with_title_of(&self, id: Uuid) -> Result<Option<VideoRecord>, StoreError>;
}

/// Run a store call with an upper bound on its duration
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Connect a PostgreSQL pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<(), StoreError> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS video_data (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS video_data_title_idx ON video_data (title)")
        .execute(pool)
        .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// PostgreSQL-backed record store
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, video: NewVideo) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO video_data (id, title, url, description) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&video.title)
            .bind(&video.url)
            .bind(&video.description)
            .execute(&self.pool)
            .await?;

        debug!(video_id = %id, "Inserted video document");
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let videos = sqlx::query_as::<_, VideoRecord>(
            "SELECT id, title, url, description, created_at FROM video_data ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM video_data")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0.max(0) as u64)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM video_data").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_first_with_title_of(&self, id: Uuid) -> Result<Option<VideoRecord>, StoreError> {
        let deleted = sqlx::query_as::<_, VideoRecord>(
            "DELETE FROM video_data WHERE id = (
                SELECT id FROM video_data
                WHERE title = (SELECT title FROM video_data WHERE id = $1)
                ORDER BY created_at, id LIMIT 1
            )
            RETURNING id, title, url, description, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deleted)
    }
}

/// In-process record store
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    videos: Mutex<Vec<VideoRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, video: NewVideo) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.videos.lock().await.push(VideoRecord {
            id,
            title: video.title,
            url: video.url,
            description: video.description,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self.videos.lock().await.clone())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.videos.lock().await.len() as u64)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut videos = self.videos.lock().await;
        let removed = videos.len() as u64;
        videos.clear();
        Ok(removed)
    }

    async fn delete_first_with_title_of(&self, id: Uuid) -> Result<Option<VideoRecord>, StoreError> {
        let mut videos = self.videos.lock().await;
        let Some(title) = videos.iter().find(|video| video.id == id).map(|video| video.title.clone())
        else {
            return Ok(None);
        };
        let position = videos.iter().position(|video| video.title == title);
        Ok(position.map(|index| videos.remove(index)))
    }
}
