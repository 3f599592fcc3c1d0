//! HTTP handler for attaching a thumbnail image to a video.
//! The image part is streamed straight into the active `ThumbnailStore`;
//! ownership is checked before any bytes are read.

use crate::{
    auth::{get_bearer_token, validate_jwt},
    errors::AppError,
    models::video::Video,
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::HeaderMap,
};
use futures::StreamExt;
use std::io;
use tracing::{info, warn};
use uuid::Uuid;

/// Name of the multipart field carrying the image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// `POST|PUT /api/thumbnail_upload/{video_id}`
///
/// Expects `Authorization: Bearer <jwt>` and a `multipart/form-data` body with
/// a `thumbnail` file part whose `Content-Type` names the image type. Responds
/// with the updated video record.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, AppError> {
    let video_id = Uuid::parse_str(&video_id)
        .map_err(|err| AppError::bad_request("Invalid ID").with_cause(&err))?;

    let token = get_bearer_token(&headers)?;
    let user_id = validate_jwt(token, &state.jwt_secret)?;

    info!(%video_id, %user_id, "uploading thumbnail");

    let mut multipart = multipart
        .map_err(|err| AppError::bad_request("Unable to parse form file").with_cause(&err))?;

    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(THUMBNAIL_FIELD) => break field,
            Ok(Some(_)) => continue,
            Ok(None) => {
                return Err(AppError::bad_request(format!(
                    "Missing `{}` form field",
                    THUMBNAIL_FIELD
                )));
            }
            Err(err) => return Err(err.into()),
        }
    };

    let media_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("Missing Content-Type for thumbnail"))?;

    let mut video = state.videos.get_video(video_id).await?;
    if !video.is_owned_by(user_id) {
        warn!(%video_id, %user_id, owner = %video.user_id, "thumbnail upload by non-owner");
        return Err(AppError::forbidden(
            "Access denied to video as the user is not the owner",
        ));
    }

    // Keep the `MultipartError` as the source so a body-limit hit still
    // maps to 413.
    let stream = field.map(|chunk| chunk.map_err(io::Error::other));
    let thumbnail_url = state
        .thumbnails
        .persist(video_id, &media_type, stream)
        .await?;

    video.thumbnail_url = Some(thumbnail_url);
    if let Err(err) = state.videos.update_video(&mut video).await {
        // The persisted bytes stay in place; the next successful upload
        // overwrites them.
        warn!(%video_id, "thumbnail stored but video record not updated");
        return Err(err.into());
    }

    info!(%video_id, "thumbnail updated");
    Ok(Json(video))
}
