use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, CurrentUser};
use crate::state::AppState;
use crate::upload::{self, Rejection, UploadKind};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:kind", post(store))
        .route("/:kind/:filename", delete(remove))
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        let status = match rejection {
            Rejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, "validation_failed", rejection.message())
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::new(err.status(), "validation_failed", err.body_text())
}

async fn store(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(segment): ApiPath<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let kind = UploadKind::from_route(&segment)
        .ok_or_else(|| ApiError::not_found("Unknown upload type"))?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        file = Some((original_name, declared_type, bytes));
        break;
    }
    let (original_name, declared_type, bytes) = file.ok_or(Rejection::Empty)?;

    let sniffed = upload::validate(kind, &bytes)?;
    if declared_type.as_deref() != Some(sniffed.mime) {
        debug!(declared = ?declared_type, detected = sniffed.mime, "upload type hint differs");
    }

    let filename = upload::stored_name(&sniffed);
    let path = upload::storage_path(&state.config.upload_dir, kind.dir(), &filename);
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to store upload");
        ApiError::internal()
    })?;
    info!(
        user_id = %ctx.user.id,
        kind = kind.dir(),
        file = %filename,
        size = bytes.len(),
        mime = sniffed.mime,
        "upload stored"
    );

    let url = upload::public_url(kind.dir(), &filename);
    let mut body = json!({
        "success": true,
        "url": url,
        "filename": filename,
        "mimeType": sniffed.mime,
        "size": bytes.len(),
        "originalName": original_name,
    });
    body[kind.url_field()] = json!(url);
    Ok(Json(body))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath((dir, filename)): ApiPath<(String, String)>,
) -> ApiResult<StatusCode> {
    let dir = upload::deletable_dir(&dir).ok_or_else(|| ApiError::bad_request("Invalid file type"))?;
    let filename = upload::sanitize_filename(&filename);
    let path = upload::storage_path(&state.config.upload_dir, dir, &filename);

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!(user_id = %ctx.user.id, dir, file = %filename, "upload deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found("File not found"))
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to delete upload");
            Err(ApiError::internal())
        }
    }
}
