//! src/services/video_store.rs
//!
//! VideoStore: the metadata store for video records. Handlers only see the
//! trait; the SQLite implementation keeps rows in the `videos` table created
//! by `migrations/0001_init.sql`.

use crate::models::video::Video;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const INIT_MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("video `{0}` not found")]
    VideoNotFound(Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence interface for video metadata.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Fetch a video by ID. Returns `VideoNotFound` if no row matches.
    async fn get_video(&self, id: Uuid) -> StoreResult<Video>;

    /// Write the mutable fields of `video` back to the store, stamping
    /// `updated_at` with the current time on both the row and `video`.
    async fn update_video(&self, video: &mut Video) -> StoreResult<()>;

    /// Lightweight connectivity check used by the readiness probe.
    async fn ping(&self) -> StoreResult<()>;
}

/// `VideoStore` backed by a shared SQLite connection pool.
#[derive(Clone)]
pub struct SqliteVideoStore {
    pub db: Arc<SqlitePool>,
}

impl SqliteVideoStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for SqliteVideoStore {
    async fn get_video(&self, id: Uuid) -> StoreResult<Video> {
        sqlx::query_as::<_, Video>(
            "SELECT id, created_at, updated_at, title, description,
                    thumbnail_url, video_url, user_id
             FROM videos WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::VideoNotFound(id),
            other => StoreError::Sqlx(other),
        })
    }

    /// Last write wins; concurrent updates to the same row are not merged.
    async fn update_video(&self, video: &mut Video) -> StoreResult<()> {
        let updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE videos
             SET title = ?, description = ?, thumbnail_url = ?, video_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.thumbnail_url.as_deref())
        .bind(video.video_url.as_deref())
        .bind(updated_at)
        .bind(video.id)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VideoNotFound(video.id));
        }

        video.updated_at = updated_at;
        debug!("updated video {}", video.id);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        let one = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        debug!("sqlite ping returned {}", one);
        Ok(())
    }
}

#[cfg(test)]
impl SqliteVideoStore {
    /// Insert a video owned by `user_id`. Video creation lives outside this
    /// service, so this is only used to seed tests.
    pub async fn create_video(&self, id: Uuid, user_id: Uuid, title: &str) -> StoreResult<Video> {
        let now = Utc::now();
        let video = Video {
            id,
            created_at: now,
            updated_at: now,
            title: title.to_string(),
            description: String::new(),
            thumbnail_url: None,
            video_url: None,
            user_id,
        };

        sqlx::query(
            "INSERT INTO videos (id, created_at, updated_at, title, description,
                                 thumbnail_url, video_url, user_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(video.id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.thumbnail_url.as_deref())
        .bind(video.video_url.as_deref())
        .bind(video.user_id)
        .execute(&*self.db)
        .await?;

        Ok(video)
    }
}

/// Run the embedded schema migration statement by statement.
pub async fn run_migrations(db: &SqlitePool) -> StoreResult<()> {
    let statements = INIT_MIGRATION
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}
