//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the video store and, for the
//!   file-backed strategy, disk I/O under the assets root

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe that always returns 200 OK and never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Runs `VideoStore::ping` and `ThumbnailStore::check_ready`. HTTP 200 when
/// both pass, HTTP 503 when either fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let store_check = match state.videos.ping().await {
        Ok(()) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    };

    let disk_check = match state.thumbnails.check_ready().await {
        Ok(()) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    };

    let overall_ok = store_check.ok && disk_check.ok;

    let mut checks = HashMap::new();
    checks.insert("video_store", store_check);
    checks.insert("assets", disk_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::{AppConfig, ThumbnailStorage},
        routes::routes::routes,
        services::video_store::tests::memory_store,
        state::AppState,
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use std::{path::Path, sync::Arc};
    use tower::ServiceExt;

    async fn app_with_assets(assets_root: &Path) -> Router {
        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 8091,
            database_url: "sqlite::memory:".into(),
            assets_root: assets_root.display().to_string(),
            public_host: "localhost".into(),
            jwt_secret: "readiness".into(),
            thumbnail_storage: ThumbnailStorage::File,
            max_thumbnail_bytes: 1024,
        };
        let state = AppState::new(&cfg, Arc::new(memory_store().await));
        routes(cfg.max_thumbnail_bytes, assets_root).with_state(state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_json(app_with_assets(dir.path()).await, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readyz_passes_with_writable_assets() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_json(app_with_assets(dir.path()).await, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["video_store"]["ok"], true);
        assert_eq!(body["checks"]["assets"]["ok"], true);
    }

    #[tokio::test]
    async fn readyz_fails_when_assets_root_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-created");
        let (status, body) = get_json(app_with_assets(&missing).await, "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");
        assert_eq!(body["checks"]["assets"]["ok"], false);
    }
}
