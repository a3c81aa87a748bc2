use chrono::NaiveDateTime;
pub use doctrack_common::DocumentStatus;
use doctrack_common::NormalizedDate;
use serde::{Deserialize, Serialize};

use crate::domain::document::error::TransitionError;

const COMPLETION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Status together with the fields it governs.
///
/// `Unassigned` iff there is no handler, `Processing` iff there is a handler and
/// the document was not reported done, `Completed` iff it was reported done.
/// Fields are only changed through the transitions below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    status: DocumentStatus,
    handler_id: Option<UserId>,
    implementer_id: Option<UserId>,
    completion_time: Option<String>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            status: DocumentStatus::Unassigned,
            handler_id: None,
            implementer_id: None,
            completion_time: None,
        }
    }

    /// Rebuilds a workflow from stored fields. Stored status values that are
    /// neither a key nor a label fall back to what the handler implies.
    pub fn restore(
        status: &str,
        handler_id: Option<UserId>,
        implementer_id: Option<UserId>,
        completion_time: Option<String>,
    ) -> Self {
        let status = DocumentStatus::parse(status).unwrap_or(match handler_id {
            Some(_) => DocumentStatus::Processing,
            None => DocumentStatus::Unassigned,
        });

        Self {
            status,
            handler_id,
            implementer_id,
            completion_time,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn handler_id(&self) -> Option<UserId> {
        self.handler_id
    }

    pub fn implementer_id(&self) -> Option<UserId> {
        self.implementer_id
    }

    pub fn completion_time(&self) -> Option<&str> {
        self.completion_time.as_deref()
    }

    /// unassigned -> processing, or hand a processing document to someone else
    pub fn assign(&mut self, handler: UserId) -> Result<(), TransitionError> {
        match self.status {
            DocumentStatus::Unassigned | DocumentStatus::Processing => {
                self.handler_id = Some(handler);
                self.status = DocumentStatus::Processing;
                Ok(())
            }
            DocumentStatus::Completed if self.handler_id == Some(handler) => Ok(()),
            DocumentStatus::Completed => Err(TransitionError::AlreadyCompleted),
        }
    }

    /// Applies the handler chosen in an edit form
    pub fn change_handler(&mut self, handler: Option<UserId>) -> Result<(), TransitionError> {
        match (handler, self.status) {
            (Some(handler), _) => self.assign(handler),
            (None, DocumentStatus::Unassigned) => Ok(()),
            (None, DocumentStatus::Processing) => Err(TransitionError::HandlerRequired),
            (None, DocumentStatus::Completed) if self.handler_id.is_none() => Ok(()),
            (None, DocumentStatus::Completed) => Err(TransitionError::AlreadyCompleted),
        }
    }

    /// processing -> completed
    pub fn complete(
        &mut self,
        implementer: UserId,
        at: NaiveDateTime,
    ) -> Result<(), TransitionError> {
        match self.status {
            DocumentStatus::Processing => {
                self.status = DocumentStatus::Completed;
                self.implementer_id = Some(implementer);
                self.completion_time = Some(at.format(COMPLETION_TIME_FORMAT).to_string());
                Ok(())
            }
            DocumentStatus::Unassigned => Err(TransitionError::NotAssigned),
            DocumentStatus::Completed => Err(TransitionError::AlreadyCompleted),
        }
    }

    /// Corrects the completion time of a completed document
    pub fn correct_completion_time(&mut self, time: &str) -> Result<(), TransitionError> {
        if self.status != DocumentStatus::Completed {
            return Err(TransitionError::NotCompleted);
        }
        self.completion_time = Some(NormalizedDate::parse(time).storage());
        Ok(())
    }
}
