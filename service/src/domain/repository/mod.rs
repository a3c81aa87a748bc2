use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::document::lifecycle::{UserId, Workflow};
use crate::domain::document::{
    AttachmentKind, Document, DocumentDetails, DocumentId, DocumentSummary, NewDocument,
};
use crate::domain::query::DocumentFilter;
use crate::domain::user::{HandlerChoice, NewUser, User, UserCredentials, UserUpdate};

pub trait DocumentRepository: Send + Sync + 'static {
    /// Number of documents matching the filter
    fn count_documents(
        &self,
        filter: &DocumentFilter,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    /// One page of matching documents, newest first
    fn find_documents(
        &self,
        filter: &DocumentFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<DocumentSummary>, RepositoryError>> + Send;

    /// `(stored status, count)` for every status present
    fn status_counts(&self)
    -> impl Future<Output = Result<Vec<(String, i64)>, RepositoryError>> + Send;

    fn find_document(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<Document, RepositoryError>> + Send;

    fn create_document(
        &self,
        document: NewDocument,
    ) -> impl Future<Output = Result<DocumentId, RepositoryError>> + Send;

    /// Overwrites the descriptive fields and the workflow fields
    fn update_document(
        &self,
        id: DocumentId,
        details: &DocumentDetails,
        workflow: &Workflow,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrites the workflow fields only
    fn save_workflow(
        &self,
        id: DocumentId,
        workflow: &Workflow,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Replaces or clears one attachment and its extracted text
    fn update_attachment(
        &self,
        id: DocumentId,
        kind: AttachmentKind,
        attachment: Option<&StoredAttachment>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_document(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

pub trait UserRepository: Send + Sync + 'static {
    fn find_credentials(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserCredentials>, RepositoryError>> + Send;

    fn find_user(&self, id: UserId)
    -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// All users ordered by id
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Users that can be picked as handler, ordered by full name
    fn list_handlers(
        &self,
    ) -> impl Future<Output = Result<Vec<HandlerChoice>, RepositoryError>> + Send;

    fn create_user(
        &self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Fails with [`RepositoryError::Conflict`] while the user handles a
    /// document that is still being processed
    fn delete_user(&self, id: UserId)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// A file saved in the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    /// File name relative to the upload directory
    pub path: String,
    /// Extracted text, empty for types without an extractor
    pub text: String,
}

/// Where uploaded files live
pub trait AttachmentStore: Send + Sync + 'static {
    /// Stores the bytes under a unique name derived from `file_name`
    fn save(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<StoredAttachment, anyhow::Error>> + Send;

    /// Removes a stored file. Failures are logged, never returned.
    fn remove(&self, path: &str) -> impl Future<Output = ()> + Send;

    /// Location of a stored file, `None` when the name is not a plain file
    /// name or the file does not exist
    fn locate(&self, name: &str) -> impl Future<Output = Option<PathBuf>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("not found")]
    NotFound,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    DatabaseError(String),
}
