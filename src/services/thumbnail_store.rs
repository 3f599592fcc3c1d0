//! src/services/thumbnail_store.rs
//!
//! ThumbnailStore: turns an uploaded image stream into a thumbnail reference.
//! Exactly one strategy is active per process, chosen by configuration:
//! - `Inline` buffers the image and returns a `data:<type>;base64,...` URL.
//! - `File` streams the image to `assets_root/<video_id>.<ext>` and returns
//!   an HTTP URL under `/assets`.

use crate::config::{AppConfig, ThumbnailStorage};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// URL path under which the assets root is served.
pub const ASSETS_ROUTE: &str = "/assets";

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("unsupported media type `{0}`")]
    UnsupportedMediaType(String),
    #[error("thumbnail exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("failed to read uploaded thumbnail: {0}")]
    Read(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

#[derive(Clone, Debug)]
pub enum ThumbnailStore {
    Inline {
        max_bytes: usize,
    },
    File {
        assets_root: PathBuf,
        /// Scheme, host and port the assets are reachable at, without a
        /// trailing slash (e.g. `http://localhost:8091`).
        public_base_url: String,
        max_bytes: usize,
    },
}

impl ThumbnailStore {
    pub fn from_config(cfg: &AppConfig) -> Self {
        match cfg.thumbnail_storage {
            ThumbnailStorage::Inline => Self::Inline {
                max_bytes: cfg.max_thumbnail_bytes,
            },
            ThumbnailStorage::File => Self::File {
                assets_root: PathBuf::from(&cfg.assets_root),
                public_base_url: cfg.public_base_url(),
                max_bytes: cfg.max_thumbnail_bytes,
            },
        }
    }

    /// Persist the image bytes from `stream` and return the reference to store
    /// on the video record.
    ///
    /// Nothing is left behind on failure: the inline variant has no side
    /// effects, and the file variant only renames into place once the whole
    /// body has been written and synced.
    pub async fn persist<S>(
        &self,
        video_id: Uuid,
        media_type: &str,
        stream: S,
    ) -> ThumbnailResult<String>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        let parsed = parse_image_type(media_type)?;

        match self {
            Self::Inline { max_bytes } => {
                let data = read_to_vec(stream, *max_bytes).await?;
                debug!("encoding {} byte thumbnail inline", data.len());
                Ok(data_url(media_type, &data))
            }
            Self::File {
                assets_root,
                public_base_url,
                max_bytes,
            } => {
                let ext = file_extension(&parsed)
                    .ok_or_else(|| ThumbnailError::UnsupportedMediaType(media_type.to_string()))?;
                let file_name = thumbnail_file_name(video_id, &ext);

                fs::create_dir_all(assets_root).await?;
                let file_path = assets_root.join(&file_name);
                let tmp_path = assets_root.join(format!(".tmp-{}", Uuid::new_v4()));

                let written = match write_stream(&tmp_path, stream, *max_bytes).await {
                    Ok(()) => move_into_place(&tmp_path, &file_path).await,
                    Err(err) => Err(err),
                };
                if let Err(err) = written {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(err);
                }

                debug!("wrote thumbnail {}", file_path.display());
                Ok(format!(
                    "{}{}/{}",
                    public_base_url.trim_end_matches('/'),
                    ASSETS_ROUTE,
                    file_name
                ))
            }
        }
    }

    /// Best-effort write/read/delete under the assets root. Always passes for
    /// the inline variant, which touches no disk.
    pub async fn check_ready(&self) -> ThumbnailResult<()> {
        let Self::File { assets_root, .. } = self else {
            return Ok(());
        };

        let probe = assets_root.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&probe, b"readyz").await?;
        let read = fs::read(&probe).await;
        let _ = fs::remove_file(&probe).await;
        if read? != b"readyz" {
            return Err(ThumbnailError::Io(io::Error::other("file content mismatch")));
        }
        Ok(())
    }
}

/// Parse `media_type` and require a top-level `image/*` type.
fn parse_image_type(media_type: &str) -> ThumbnailResult<mime::Mime> {
    match media_type.parse::<mime::Mime>() {
        Ok(parsed) if parsed.type_() == mime::IMAGE => Ok(parsed),
        _ => Err(ThumbnailError::UnsupportedMediaType(media_type.to_string())),
    }
}

/// Extension derived from the subtype (`image/png` -> `png`). Subtypes that
/// are not plain alphanumerics (`svg+xml`, anything with a path separator)
/// cannot be used as a file extension.
fn file_extension(mime: &mime::Mime) -> Option<String> {
    let subtype = mime.subtype().as_str().to_ascii_lowercase();
    if subtype.is_empty() || !subtype.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(subtype)
}

fn thumbnail_file_name(video_id: Uuid, ext: &str) -> String {
    format!("{}.{}", video_id, ext)
}

fn data_url(media_type: &str, data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        media_type,
        general_purpose::STANDARD.encode(data)
    )
}

async fn read_to_vec<S>(stream: S, max_bytes: usize) -> ThumbnailResult<Vec<u8>>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let mut data = Vec::new();
    pin_mut!(stream);
    while let Some(chunk_res) = stream.next().await {
        let chunk = chunk_res.map_err(ThumbnailError::Read)?;
        if data.len() + chunk.len() > max_bytes {
            return Err(ThumbnailError::TooLarge { limit: max_bytes });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Stream into a new file at `path`, flushing and syncing before returning.
/// The handle is dropped on every exit path; the caller removes `path` on error.
async fn write_stream<S>(path: &Path, stream: S, max_bytes: usize) -> ThumbnailResult<()>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let mut file = File::create(path).await?;
    let mut size_bytes: usize = 0;

    pin_mut!(stream);
    while let Some(chunk_res) = stream.next().await {
        let chunk = chunk_res.map_err(ThumbnailError::Read)?;
        size_bytes += chunk.len();
        if size_bytes > max_bytes {
            return Err(ThumbnailError::TooLarge { limit: max_bytes });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;

    debug!("streamed {} bytes to {}", size_bytes, path.display());
    Ok(())
}

/// Rename `tmp` over `dest`, replacing an existing file on platforms whose
/// rename refuses to overwrite. `tmp` is left behind on error.
async fn move_into_place(tmp: &Path, dest: &Path) -> ThumbnailResult<()> {
    match fs::rename(tmp, dest).await {
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            fs::remove_file(dest).await?;
            fs::rename(tmp, dest).await?;
            Ok(())
        }
        other => Ok(other?),
    }
}
