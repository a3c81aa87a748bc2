use crate::domain::AppState;
use crate::infrastructure::persistence::documents::SqliteDocumentRepository;
use crate::infrastructure::persistence::users::SqliteUserRepository;
use crate::infrastructure::storage::UploadStorage;

pub mod extract;
pub mod http;
pub mod persistence;
pub mod settings;
pub mod storage;

#[derive(Clone, Debug)]
pub struct AppStateImpl {
    documents: SqliteDocumentRepository,
    users: SqliteUserRepository,
    attachments: UploadStorage,
    password_rounds: u32,
}

impl AppStateImpl {
    pub fn new(
        documents: SqliteDocumentRepository,
        users: SqliteUserRepository,
        attachments: UploadStorage,
        password_rounds: u32,
    ) -> Self {
        Self {
            documents,
            users,
            attachments,
            password_rounds,
        }
    }
}

impl AppState for AppStateImpl {
    type D = SqliteDocumentRepository;
    type U = SqliteUserRepository;
    type A = UploadStorage;

    fn documents(&self) -> &Self::D {
        &self.documents
    }

    fn users(&self) -> &Self::U {
        &self.users
    }

    fn attachments(&self) -> &Self::A {
        &self.attachments
    }

    fn password_rounds(&self) -> u32 {
        self.password_rounds
    }
}
