//! Helpers for tests that need a live document store.
//!
//! Public so that other crates can reuse it for their own tests.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::database::Database;
use crate::domain::persistence::migrate;
use crate::domain::status::DocumentStatus;
use crate::domain::users::{Role, hash_password};

/// Cheap hashing for tests, production uses the configured rounds
pub const TEST_PASSWORD_ROUNDS: u32 = 1_000;
pub const TEST_PASSWORD: &str = "password";

/// Fresh in-memory database without any tables.
///
/// The pool keeps exactly one connection alive forever, an in-memory SQLite
/// database lives only as long as its connection.
pub async fn empty_memory_database() -> Database {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("failed to open in-memory database");

    Database::from_pool(pool)
}

/// Fresh in-memory database with the application schema applied
pub async fn memory_database() -> Database {
    let database = empty_memory_database().await;
    migrate(&database)
        .await
        .expect("failed to migrate in-memory database");
    database
}

/// Inserts a user with [`TEST_PASSWORD`] and returns its id
pub async fn insert_user(database: &Database, username: &str, full_name: &str, role: Role) -> i64 {
    let password_hash =
        hash_password(TEST_PASSWORD, TEST_PASSWORD_ROUNDS).expect("failed to hash password");

    sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, full_name, position, role)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(password_hash)
    .bind(full_name)
    .bind("Officer")
    .bind(role.as_str())
    .fetch_one(database.database_pool())
    .await
    .expect("failed to insert user")
}

/// Minimal document row for filter and pagination tests
#[derive(Debug, Clone, Default)]
pub struct DocumentSeed<'a> {
    pub title: &'a str,
    pub country: Option<&'a str>,
    pub creation_date: Option<&'a str>,
    pub status: &'a str,
    pub handler_id: Option<i64>,
    pub implementer_id: Option<i64>,
    pub completion_time: Option<&'a str>,
}

impl<'a> DocumentSeed<'a> {
    pub fn titled(title: &'a str) -> Self {
        Self {
            title,
            status: DocumentStatus::Unassigned.key(),
            ..Default::default()
        }
    }
}

/// Inserts a document row as-is, bypassing the service lifecycle
pub async fn insert_document(database: &Database, seed: DocumentSeed<'_>) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO documents
            (title, country, creation_date, status, handler_id, implementer_id, completion_time)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(seed.title)
    .bind(seed.country)
    .bind(seed.creation_date)
    .bind(seed.status)
    .bind(seed.handler_id)
    .bind(seed.implementer_id)
    .bind(seed.completion_time)
    .fetch_one(database.database_pool())
    .await
    .expect("failed to insert document")
}
