use doctrack_common::{Database, DocumentStatus, Role};
use sqlx::Sqlite;

use crate::domain::document::lifecycle::UserId;
use crate::domain::repository::{RepositoryError, UserRepository};
use crate::domain::user::{HandlerChoice, NewUser, User, UserCredentials, UserUpdate};
use crate::infrastructure::persistence::database_error;

const USER_COLUMNS: &str = "id, username, full_name, position, role, avatar_path";

#[derive(Clone, Debug)]
pub struct SqliteUserRepository {
    database: Database,
}

impl SqliteUserRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    full_name: String,
    position: Option<String>,
    role: String,
    avatar_path: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: UserId(record.id),
            username: record.username,
            full_name: record.full_name,
            position: record.position,
            role: Role::from(record.role.as_str()),
            avatar_path: record.avatar_path,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRecord {
    #[sqlx(flatten)]
    user: UserRecord,
    password_hash: String,
}

impl UserRepository for SqliteUserRepository {
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let record = sqlx::query_as::<Sqlite, CredentialsRecord>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "failed to load credentials"))?;

        Ok(record.map(|record| UserCredentials {
            user: record.user.into(),
            password_hash: record.password_hash,
        }))
    }

    async fn find_user(&self, id: UserId) -> Result<User, RepositoryError> {
        sqlx::query_as::<Sqlite, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "failed to load user"))?
        .map(User::from)
        .ok_or(RepositoryError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let records = sqlx::query_as::<Sqlite, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "failed to list users"))?;

        Ok(records.into_iter().map(User::from).collect())
    }

    async fn list_handlers(&self) -> Result<Vec<HandlerChoice>, RepositoryError> {
        let handlers = sqlx::query_as::<Sqlite, (i64, String)>(
            "SELECT id, full_name FROM users ORDER BY full_name, id",
        )
        .fetch_all(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "failed to list handlers"))?;

        Ok(handlers
            .into_iter()
            .map(|(id, full_name)| HandlerChoice { id, full_name })
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let username = user.username.into_inner();
        let record = sqlx::query_as::<Sqlite, UserRecord>(&format!(
            "INSERT INTO users (username, password_hash, full_name, position, role)
             VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(&username)
        .bind(user.password_hash)
        .bind(user.full_name)
        .bind(user.position)
        .bind(user.role.as_str())
        .fetch_one(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, &format!("username {username} already exists")))?;

        tracing::info!(id = record.id, username = %username, "user created");
        Ok(record.into())
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<Sqlite, UserRecord>(&format!(
            "UPDATE users SET
                full_name = COALESCE(?, full_name),
                position = COALESCE(?, position),
                role = COALESCE(?, role),
                password_hash = COALESCE(?, password_hash)
             WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(update.full_name)
        .bind(update.position)
        .bind(update.role.map(|role| role.as_str()))
        .bind(update.password_hash)
        .bind(id.0)
        .fetch_optional(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "failed to update user"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(record.into())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut transaction = self
            .database
            .database_pool()
            .begin()
            .await
            .map_err(|e| database_error(e, "failed to start transaction"))?;

        let handled: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE handler_id = ? AND status = ?",
        )
        .bind(id.0)
        .bind(DocumentStatus::Processing.key())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|e| database_error(e, "failed to check handled documents"))?;

        if handled > 0 {
            return Err(RepositoryError::Conflict(format!(
                "user still handles {handled} document(s) in processing"
            )));
        }

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.0)
            .execute(&mut *transaction)
            .await
            .map_err(|e| database_error(e, "failed to delete user"))?
            .rows_affected();

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        transaction
            .commit()
            .await
            .map_err(|e| database_error(e, "failed to commit user deletion"))?;

        tracing::info!(id = id.0, "user deleted");
        Ok(())
    }
}
