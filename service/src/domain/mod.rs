use crate::domain::repository::{AttachmentStore, DocumentRepository, UserRepository};

pub mod document;
pub mod query;
pub mod repository;
pub mod user;

/// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type D: DocumentRepository;
    type U: UserRepository;
    type A: AttachmentStore;

    fn documents(&self) -> &Self::D;
    fn users(&self) -> &Self::U;
    fn attachments(&self) -> &Self::A;
    /// PBKDF2 rounds for newly set passwords
    fn password_rounds(&self) -> u32;
}
