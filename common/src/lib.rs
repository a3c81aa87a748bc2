pub mod database;
pub mod domain;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Table names

pub const USERS_TABLE_NAME: &'static str = "users";
pub const DOCUMENTS_TABLE_NAME: &'static str = "documents";

// Persisted field names shared by the service queries and the schema

pub const ID_FIELD_NAME: &'static str = "id";
pub const CREATED_FIELD_NAME: &'static str = "created_at";

pub const TITLE_FIELD_NAME: &'static str = "title";
pub const COUNTRY_FIELD_NAME: &'static str = "country";
pub const CREATION_DATE_FIELD_NAME: &'static str = "creation_date";
pub const STATUS_FIELD_NAME: &'static str = "status";
pub const HANDLER_ID_FIELD_NAME: &'static str = "handler_id";
pub const IMPLEMENTER_ID_FIELD_NAME: &'static str = "implementer_id";
pub const COMPLETION_TIME_FIELD_NAME: &'static str = "completion_time";

pub const USERNAME_FIELD_NAME: &'static str = "username";
pub const FULL_NAME_FIELD_NAME: &'static str = "full_name";

// expose domain module

pub use domain::*;

// expose database module

pub use database::{Database, DatabaseSettings, connect as connect_to_database};
