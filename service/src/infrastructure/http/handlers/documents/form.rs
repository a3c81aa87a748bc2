//! Multipart bodies of the document routes.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use crate::domain::document::DocumentDetails;
use crate::domain::query::UNASSIGNED_HANDLER;
use crate::infrastructure::http::api::ApiError;

/// A file part with a non-empty name and body
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Registration form of a new document
#[derive(Debug, Default)]
pub struct DocumentForm {
    pub details: DocumentDetails,
    pub handler_id: Option<i64>,
    pub original_file: Option<Upload>,
    pub translated_file: Option<Upload>,
}

impl DocumentForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = DocumentForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "original_file" => form.original_file = read_upload(field).await?,
                "translated_file" => form.translated_file = read_upload(field).await?,
                _ => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.set_text(&name, value)?;
                }
            }
        }

        if form.details.title.trim().is_empty() {
            return Err(ApiError::UnprocessableEntity("title is required".to_string()));
        }
        form.details = form.details.normalized();
        Ok(form)
    }

    fn set_text(&mut self, name: &str, value: String) -> Result<(), ApiError> {
        let details = &mut self.details;
        match name {
            "title" => details.title = value,
            "authoring_agency" => details.authoring_agency = Some(value),
            "country" => details.country = Some(value),
            "creation_date" | "draft_time" => details.creation_date = Some(value),
            "source_type" => details.source_type = Some(value),
            "confidentiality_level" => details.confidentiality_level = Some(value),
            "urgency_level" => details.urgency_level = Some(value),
            "week_number" => details.week_number = optional_number(name, &value)?,
            "year_number" => details.year_number = optional_number(name, &value)?,
            "main_content" | "main_content_summary" => details.main_content_summary = Some(value),
            "notes" => details.notes = Some(value),
            "handler_id" => self.handler_id = handler_id(&value)?,
            other => tracing::debug!("ignoring form field {other}"),
        }
        Ok(())
    }
}

/// Reads the single `file` part of an attachment replacement
pub async fn read_single_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            if let Some(upload) = read_upload(field).await? {
                return Ok(upload);
            }
        }
    }
    Err(ApiError::UnprocessableEntity("file is required".to_string()))
}

async fn read_upload(field: axum::extract::multipart::Field<'_>) -> Result<Option<Upload>, ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;

    if file_name.is_empty() || bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Upload {
        file_name,
        bytes: bytes.to_vec(),
    }))
}

/// Empty means not set, `null` is accepted as "nobody"
fn handler_id(value: &str) -> Result<Option<i64>, ApiError> {
    match value.trim() {
        "" | UNASSIGNED_HANDLER => Ok(None),
        id => id
            .parse()
            .map(Some)
            .map_err(|_| ApiError::UnprocessableEntity(format!("invalid handler_id {id}"))),
    }
}

fn optional_number(name: &str, value: &str) -> Result<Option<i64>, ApiError> {
    match value.trim() {
        "" => Ok(None),
        number => number
            .parse()
            .map(Some)
            .map_err(|_| ApiError::UnprocessableEntity(format!("{name} must be a number"))),
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::BadRequest(e.body_text())
}
