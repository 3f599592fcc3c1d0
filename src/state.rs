//! Shared state handed to every handler.

use crate::{
    config::AppConfig,
    services::{thumbnail_store::ThumbnailStore, video_store::VideoStore},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Metadata store for video records.
    pub videos: Arc<dyn VideoStore>,

    /// Active thumbnail persistence strategy.
    pub thumbnails: ThumbnailStore,

    /// Secret used to verify bearer tokens.
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(cfg: &AppConfig, videos: Arc<dyn VideoStore>) -> Self {
        Self {
            videos,
            thumbnails: ThumbnailStore::from_config(cfg),
            jwt_secret: Arc::from(cfg.jwt_secret.as_str()),
        }
    }
}
