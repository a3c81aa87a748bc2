use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::domain::AppState;
use crate::domain::repository::AttachmentStore;
use crate::infrastructure::http::api::ApiError;
use crate::infrastructure::http::auth::CurrentUser;

pub const UPLOADS_PREFIX: &str = "/uploads";

/// Public URL of a stored file name
pub fn upload_url(name: &str) -> String {
    format!("{UPLOADS_PREFIX}/{name}")
}

pub async fn serve_upload<S: AppState>(
    State(state): State<S>,
    _user: CurrentUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state
        .attachments()
        .locate(&name)
        .await
        .ok_or(ApiError::NotFound)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to read {}: {e}", path.display())))?;

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, content_type.to_string())], bytes))
}
