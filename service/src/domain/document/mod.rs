pub mod error;
pub mod lifecycle;
pub mod summary;

use doctrack_common::NormalizedDate;
use serde::{Deserialize, Serialize};

use crate::domain::document::lifecycle::{DocumentStatus, Workflow};

/// Store-assigned document identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub i64);

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Fields entered by staff when a document is registered or edited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDetails {
    pub title: String,
    pub authoring_agency: Option<String>,
    pub country: Option<String>,
    pub creation_date: Option<String>,
    pub source_type: Option<String>,
    pub confidentiality_level: Option<String>,
    pub urgency_level: Option<String>,
    /// Manual period tag, unrelated to `creation_date`
    pub week_number: Option<i64>,
    pub year_number: Option<i64>,
    pub main_content_summary: Option<String>,
    pub notes: Option<String>,
}

impl DocumentDetails {
    /// Trims text fields, drops empty ones and brings a parseable creation
    /// date into storage form. Unparseable dates are kept as typed.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            authoring_agency: non_empty(self.authoring_agency),
            country: non_empty(self.country),
            creation_date: non_empty(self.creation_date)
                .map(|date| NormalizedDate::parse(&date).storage()),
            source_type: non_empty(self.source_type),
            confidentiality_level: non_empty(self.confidentiality_level),
            urgency_level: non_empty(self.urgency_level),
            week_number: self.week_number,
            year_number: self.year_number,
            main_content_summary: non_empty(self.main_content_summary),
            notes: non_empty(self.notes),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Attached files and the text extracted from them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContent {
    pub original_file_path: Option<String>,
    pub translated_file_path: Option<String>,
    pub original_text: Option<String>,
    pub translated_text: Option<String>,
}

impl DocumentContent {
    pub fn file_path(&self, kind: AttachmentKind) -> Option<&str> {
        match kind {
            AttachmentKind::Original => self.original_file_path.as_deref(),
            AttachmentKind::Translated => self.translated_file_path.as_deref(),
        }
    }

    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.original_file_path
            .as_deref()
            .into_iter()
            .chain(self.translated_file_path.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Original,
    Translated,
}

impl AttachmentKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "original" => Some(Self::Original),
            "translated" => Some(Self::Translated),
            _ => None,
        }
    }
}

/// A document with everything needed for the detail view
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub details: DocumentDetails,
    pub content: DocumentContent,
    pub workflow: Workflow,
    pub handler_name: Option<String>,
    pub implementer_name: Option<String>,
    pub created_at: String,
}

/// One row of the document list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    pub authoring_agency: Option<String>,
    pub country: Option<String>,
    pub creation_date: Option<String>,
    pub source_type: Option<String>,
    pub confidentiality_level: Option<String>,
    pub urgency_level: Option<String>,
    pub status: DocumentStatus,
    pub handler_id: Option<i64>,
    pub handler_name: Option<String>,
    pub week_number: Option<i64>,
    pub year_number: Option<i64>,
    pub has_original_file: bool,
    pub has_translated_file: bool,
    pub created_at: String,
}

/// A document about to be inserted
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub details: DocumentDetails,
    pub content: DocumentContent,
    pub workflow: Workflow,
}

/// Dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub total: i64,
    pub unassigned: i64,
    pub processing: i64,
    pub completed: i64,
}

impl DocumentStats {
    /// Builds the counters from `(stored status, count)` pairs
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        counts
            .into_iter()
            .fold(Self::default(), |mut stats, (status, count)| {
                stats.total += count;
                match DocumentStatus::parse(status) {
                    Some(DocumentStatus::Unassigned) => stats.unassigned += count,
                    Some(DocumentStatus::Processing) => stats.processing += count,
                    Some(DocumentStatus::Completed) => stats.completed += count,
                    None => tracing::warn!("unknown document status {status} in store"),
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_details_canonicalize_creation_date() {
        let details = DocumentDetails {
            title: "  Draft MOU on Cooperation ".to_string(),
            creation_date: Some("2024-01-17T08:30".to_string()),
            country: Some("   ".to_string()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(details.title, "Draft MOU on Cooperation");
        assert_eq!(details.creation_date.as_deref(), Some("2024-01-17 08:30:00"));
        assert_eq!(details.country, None);
    }

    #[test]
    fn normalized_details_keep_unparseable_dates() {
        let details = DocumentDetails {
            title: "x".to_string(),
            creation_date: Some("tháng 3".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(details.creation_date.as_deref(), Some("tháng 3"));
    }

    #[test]
    fn stats_count_each_status() {
        let stats = DocumentStats::from_counts([
            ("unassigned", 4),
            ("processing", 2),
            ("completed", 7),
        ]);
        assert_eq!(
            stats,
            DocumentStats {
                total: 13,
                unassigned: 4,
                processing: 2,
                completed: 7
            }
        );
    }

    #[test]
    fn attachment_kind_parses_path_segments() {
        assert_eq!(AttachmentKind::parse("original"), Some(AttachmentKind::Original));
        assert_eq!(AttachmentKind::parse("translated"), Some(AttachmentKind::Translated));
        assert_eq!(AttachmentKind::parse("Original"), None);
    }
}
