use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Workflow stage of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// No handler assigned yet
    Unassigned,
    /// A handler is working on it
    Processing,
    /// Reported done, carries implementer and completion time
    Completed,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 3] = [
        DocumentStatus::Unassigned,
        DocumentStatus::Processing,
        DocumentStatus::Completed,
    ];

    /// Value persisted in the store
    pub fn key(&self) -> &'static str {
        match self {
            DocumentStatus::Unassigned => "unassigned",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
        }
    }

    /// Label shown to staff
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Unassigned => "Chưa xử lý",
            DocumentStatus::Processing => "Đang xử lý",
            DocumentStatus::Completed => "Đã xử lý",
        }
    }

    /// Exact match against a key or a label
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.key() == value || status.label() == value)
    }
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
