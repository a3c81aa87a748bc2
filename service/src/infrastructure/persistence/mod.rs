use crate::domain::repository::RepositoryError;

pub mod columns;
pub mod documents;
pub mod parameters;
pub mod query;
pub mod schema;
pub mod users;

/// Maps a driver error onto the repository vocabulary. Constraint
/// violations carry `context`, everything else is logged and hidden.
fn database_error(error: sqlx::Error, context: &str) -> RepositoryError {
    match &error {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::UniqueViolation(context.to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            RepositoryError::ValidationFailed(context.to_string())
        }
        _ => {
            tracing::error!("{context}: {error:?}");
            RepositoryError::DatabaseError(error.to_string())
        }
    }
}

fn argument_error(error: sqlx::error::BoxDynError) -> RepositoryError {
    RepositoryError::DatabaseError(format!("failed to bind query arguments: {error}"))
}
