pub mod thumbnail_store;
pub mod video_store;
