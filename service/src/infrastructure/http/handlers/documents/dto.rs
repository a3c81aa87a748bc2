use doctrack_common::dates;
use serde::{Deserialize, Serialize};

use crate::domain::document::{Document, DocumentDetails, DocumentSummary};
use crate::domain::query::{DocumentPage, FilterEcho};
use crate::infrastructure::http::handlers::uploads::upload_url;

/// A stored timestamp in every form a client needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateForms {
    pub raw: Option<String>,
    pub display: String,
    pub date_input: String,
    pub datetime_input: String,
}

impl From<Option<&str>> for DateForms {
    fn from(raw: Option<&str>) -> Self {
        Self {
            raw: raw.map(str::to_string),
            display: dates::display(raw),
            date_input: dates::date_input(raw),
            datetime_input: dates::datetime_input(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRowResponse {
    pub id: i64,
    pub title: String,
    pub authoring_agency: Option<String>,
    pub country: Option<String>,
    pub creation_date: Option<String>,
    pub creation_date_display: String,
    pub source_type: Option<String>,
    pub confidentiality_level: Option<String>,
    pub urgency_level: Option<String>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub handler_id: Option<i64>,
    pub handler_name: Option<String>,
    pub week_number: Option<i64>,
    pub year_number: Option<i64>,
    pub has_original_file: bool,
    pub has_translated_file: bool,
    pub created_at: String,
}

impl From<DocumentSummary> for DocumentRowResponse {
    fn from(row: DocumentSummary) -> Self {
        Self {
            id: row.id.0,
            creation_date_display: dates::display(row.creation_date.as_deref()),
            title: row.title,
            authoring_agency: row.authoring_agency,
            country: row.country,
            creation_date: row.creation_date,
            source_type: row.source_type,
            confidentiality_level: row.confidentiality_level,
            urgency_level: row.urgency_level,
            status: row.status.key(),
            status_label: row.status.label(),
            handler_id: row.handler_id,
            handler_name: row.handler_name,
            week_number: row.week_number,
            year_number: row.year_number,
            has_original_file: row.has_original_file,
            has_translated_file: row.has_translated_file,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListMeta {
    pub total_filtered: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
    pub filters: FilterEcho,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentListResponse {
    pub data: Vec<DocumentRowResponse>,
    pub meta: ListMeta,
}

impl From<DocumentPage> for DocumentListResponse {
    fn from(page: DocumentPage) -> Self {
        Self {
            data: page.rows.into_iter().map(DocumentRowResponse::from).collect(),
            meta: ListMeta {
                total_filtered: page.window.total_filtered,
                total_pages: page.window.total_pages,
                page: page.window.page,
                page_size: page.window.page_size,
                filters: page.filters,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRef {
    pub id: i64,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentResponse {
    pub path: String,
    pub url: String,
}

impl AttachmentResponse {
    fn from_path(path: Option<String>) -> Option<Self> {
        path.map(|path| Self {
            url: upload_url(&path),
            path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResponse {
    pub id: i64,
    pub title: String,
    pub authoring_agency: Option<String>,
    pub country: Option<String>,
    pub creation_date: DateForms,
    pub source_type: Option<String>,
    pub confidentiality_level: Option<String>,
    pub urgency_level: Option<String>,
    pub week_number: Option<i64>,
    pub year_number: Option<i64>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub handler: Option<PersonRef>,
    pub implementer: Option<PersonRef>,
    pub completion_time: DateForms,
    pub original_file: Option<AttachmentResponse>,
    pub translated_file: Option<AttachmentResponse>,
    pub original_text: Option<String>,
    pub translated_text: Option<String>,
    pub main_content_summary: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateForms,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        let Document {
            id,
            details,
            content,
            workflow,
            handler_name,
            implementer_name,
            created_at,
        } = document;

        Self {
            id: id.0,
            title: details.title,
            authoring_agency: details.authoring_agency,
            country: details.country,
            creation_date: DateForms::from(details.creation_date.as_deref()),
            source_type: details.source_type,
            confidentiality_level: details.confidentiality_level,
            urgency_level: details.urgency_level,
            week_number: details.week_number,
            year_number: details.year_number,
            status: workflow.status().key(),
            status_label: workflow.status().label(),
            handler: workflow.handler_id().map(|id| PersonRef {
                id: id.0,
                full_name: handler_name,
            }),
            implementer: workflow.implementer_id().map(|id| PersonRef {
                id: id.0,
                full_name: implementer_name,
            }),
            completion_time: DateForms::from(workflow.completion_time()),
            original_file: AttachmentResponse::from_path(content.original_file_path),
            translated_file: AttachmentResponse::from_path(content.translated_file_path),
            original_text: content.original_text,
            translated_text: content.translated_text,
            main_content_summary: details.main_content_summary,
            notes: details.notes,
            created_at: DateForms::from(Some(created_at.as_str())),
        }
    }
}

/// Admin edit. Status is not editable, it follows from the handler.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: String,
    pub authoring_agency: Option<String>,
    pub country: Option<String>,
    pub creation_date: Option<String>,
    pub source_type: Option<String>,
    pub confidentiality_level: Option<String>,
    pub urgency_level: Option<String>,
    pub week_number: Option<i64>,
    pub year_number: Option<i64>,
    #[serde(alias = "main_content")]
    pub main_content_summary: Option<String>,
    pub notes: Option<String>,
    pub handler_id: Option<i64>,
    /// Only accepted on completed documents
    pub completion_time: Option<String>,
}

impl UpdateDocumentRequest {
    pub fn details(&self) -> DocumentDetails {
        DocumentDetails {
            title: self.title.clone(),
            authoring_agency: self.authoring_agency.clone(),
            country: self.country.clone(),
            creation_date: self.creation_date.clone(),
            source_type: self.source_type.clone(),
            confidentiality_level: self.confidentiality_level.clone(),
            urgency_level: self.urgency_level.clone(),
            week_number: self.week_number,
            year_number: self.year_number,
            main_content_summary: self.main_content_summary.clone(),
            notes: self.notes.clone(),
        }
        .normalized()
    }
}
