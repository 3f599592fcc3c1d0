//! Represents a video record and the thumbnail reference attached to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for a single uploaded video.
///
/// Rows are created by the video creation flow; this service only ever
/// rewrites `thumbnail_url` (and bumps `updated_at`).
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Video {
    /// Unique identifier for this video.
    pub id: Uuid,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,

    pub title: String,

    pub description: String,

    /// Either a `data:` URL with the image inline, or an HTTP URL to a file
    /// under the assets root. `None` until the first thumbnail upload.
    pub thumbnail_url: Option<String>,

    pub video_url: Option<String>,

    /// ID of the user who owns this video.
    pub user_id: Uuid,
}

impl Video {
    /// Whether `user_id` is allowed to modify this video.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
