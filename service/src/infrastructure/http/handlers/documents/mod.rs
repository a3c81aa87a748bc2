use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::domain::AppState;
use crate::domain::document::lifecycle::{UserId, Workflow};
use crate::domain::document::summary::auto_summary;
use crate::domain::document::{
    AttachmentKind, DocumentContent, DocumentId, DocumentStats, NewDocument,
};
use crate::domain::query::{DocumentListQuery, ListParams, list_documents};
use crate::domain::repository::{
    AttachmentStore, DocumentRepository, RepositoryError, StoredAttachment, UserRepository,
};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::auth::{AdminUser, CurrentUser};
use crate::infrastructure::http::handlers::documents::dto::{
    DocumentListResponse, DocumentResponse, UpdateDocumentRequest,
};
use crate::infrastructure::http::handlers::documents::form::{
    DocumentForm, Upload, read_single_upload,
};
use crate::infrastructure::http::querystring::QueryString;

pub mod dto;
pub mod form;

pub async fn list_documents_handler<S: AppState>(
    State(state): State<S>,
    _user: CurrentUser,
    QueryString(params): QueryString<ListParams>,
) -> Result<ApiSuccess<DocumentListResponse>, ApiError> {
    let page = list_documents(state.documents(), DocumentListQuery::from(params)).await?;
    Ok(ApiSuccess::new(StatusCode::OK, page.into()))
}

pub async fn document_stats<S: AppState>(
    State(state): State<S>,
    _user: CurrentUser,
) -> Result<ApiSuccess<DocumentStats>, ApiError> {
    let counts = state.documents().status_counts().await?;
    let stats = DocumentStats::from_counts(
        counts
            .iter()
            .map(|(status, count)| (status.as_str(), *count)),
    );
    Ok(ApiSuccess::new(StatusCode::OK, stats))
}

pub async fn find_document<S: AppState>(
    State(state): State<S>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    let document = state.documents().find_document(DocumentId(id)).await?;
    Ok(ApiSuccess::new(StatusCode::OK, document.into()))
}

pub async fn create_document<S: AppState>(
    State(state): State<S>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    let DocumentForm {
        mut details,
        handler_id,
        original_file,
        translated_file,
    } = DocumentForm::read(multipart).await?;

    ensure_handler(&state, handler_id).await?;
    let mut workflow = Workflow::new();
    workflow.change_handler(handler_id.map(UserId))?;

    let original = store(state.attachments(), original_file).await?;
    let translated = match store(state.attachments(), translated_file).await {
        Ok(translated) => translated,
        Err(e) => {
            discard(state.attachments(), [&original]).await;
            return Err(e);
        }
    };

    if details.main_content_summary.is_none() {
        details.main_content_summary = Some(auto_summary(
            translated.as_ref().map(|attachment| attachment.text.as_str()),
        ));
    }

    let content = DocumentContent {
        original_file_path: original.as_ref().map(|a| a.path.clone()),
        translated_file_path: translated.as_ref().map(|a| a.path.clone()),
        original_text: original.as_ref().map(|a| a.text.clone()),
        translated_text: translated.as_ref().map(|a| a.text.clone()),
    };

    let created = state
        .documents()
        .create_document(NewDocument {
            details,
            content,
            workflow,
        })
        .await;
    let id = match created {
        Ok(id) => id,
        Err(e) => {
            discard(state.attachments(), [&original, &translated]).await;
            return Err(e.into());
        }
    };

    tracing::info!(id = id.0, by = %user.username, "document registered");
    let document = state.documents().find_document(id).await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, document.into()))
}

pub async fn update_document<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    let id = DocumentId(id);
    let details = request.details();
    if details.title.is_empty() {
        return Err(ApiError::UnprocessableEntity("title is required".to_string()));
    }

    ensure_handler(&state, request.handler_id).await?;
    let mut workflow = state.documents().find_document(id).await?.workflow;
    workflow.change_handler(request.handler_id.map(UserId))?;
    if let Some(completion_time) = request
        .completion_time
        .as_deref()
        .map(str::trim)
        .filter(|time| !time.is_empty())
    {
        workflow.correct_completion_time(completion_time)?;
    }

    state
        .documents()
        .update_document(id, &details, &workflow)
        .await?;

    let document = state.documents().find_document(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, document.into()))
}

pub async fn report_document<S: AppState>(
    State(state): State<S>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    let id = DocumentId(id);
    let mut workflow = state.documents().find_document(id).await?.workflow;
    workflow.complete(user.id, Utc::now().naive_utc())?;
    state.documents().save_workflow(id, &workflow).await?;

    tracing::info!(id = id.0, by = %user.username, "document reported completed");
    let document = state.documents().find_document(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, document.into()))
}

pub async fn delete_document<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = DocumentId(id);
    let document = state.documents().find_document(id).await?;
    state.documents().delete_document(id).await?;

    futures::future::join_all(
        document
            .content
            .file_paths()
            .map(|path| state.attachments().remove(path)),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_attachment<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
    Path((id, kind)): Path<(i64, String)>,
    multipart: Multipart,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    let id = DocumentId(id);
    let kind = attachment_kind(&kind)?;
    let document = state.documents().find_document(id).await?;
    let upload = read_single_upload(multipart).await?;

    let stored = state
        .attachments()
        .save(&upload.file_name, &upload.bytes)
        .await?;
    if let Err(e) = state
        .documents()
        .update_attachment(id, kind, Some(&stored))
        .await
    {
        state.attachments().remove(&stored.path).await;
        return Err(e.into());
    }

    if let Some(previous) = document.content.file_path(kind) {
        state.attachments().remove(previous).await;
    }

    let document = state.documents().find_document(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, document.into()))
}

pub async fn remove_attachment<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
    Path((id, kind)): Path<(i64, String)>,
) -> Result<StatusCode, ApiError> {
    let id = DocumentId(id);
    let kind = attachment_kind(&kind)?;
    let document = state.documents().find_document(id).await?;

    state.documents().update_attachment(id, kind, None).await?;
    if let Some(previous) = document.content.file_path(kind) {
        state.attachments().remove(previous).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_handler<S: AppState>(state: &S, handler_id: Option<i64>) -> Result<(), ApiError> {
    let Some(handler_id) = handler_id else {
        return Ok(());
    };
    match state.users().find_user(UserId(handler_id)).await {
        Ok(_) => Ok(()),
        Err(RepositoryError::NotFound) => Err(ApiError::UnprocessableEntity(format!(
            "handler {handler_id} does not exist"
        ))),
        Err(e) => Err(e.into()),
    }
}

fn attachment_kind(kind: &str) -> Result<AttachmentKind, ApiError> {
    AttachmentKind::parse(kind).ok_or(ApiError::NotFound)
}

async fn store<A: AttachmentStore>(
    attachments: &A,
    upload: Option<Upload>,
) -> Result<Option<StoredAttachment>, ApiError> {
    match upload {
        Some(upload) => Ok(Some(attachments.save(&upload.file_name, &upload.bytes).await?)),
        None => Ok(None),
    }
}

/// Best-effort cleanup of files saved for a request that failed
async fn discard<A: AttachmentStore, const N: usize>(
    attachments: &A,
    stored: [&Option<StoredAttachment>; N],
) {
    for attachment in stored.into_iter().flatten() {
        attachments.remove(&attachment.path).await;
    }
}
