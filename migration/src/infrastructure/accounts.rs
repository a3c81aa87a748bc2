use anyhow::Context;
use doctrack_common::{Database, Role};

use crate::domain::accounts::Accounts;

#[derive(Clone, Debug)]
pub struct AccountsAdapter {
    database: Database,
}

impl AccountsAdapter {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl Accounts for AccountsAdapter {
    async fn username_exists(&self, username: &str) -> Result<bool, anyhow::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.database.database_pool())
            .await
            .with_context(|| format!("failed to look up user {username}"))?;
        Ok(count > 0)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        position: &str,
        role: Role,
    ) -> Result<i64, anyhow::Error> {
        sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, full_name, position, role)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(full_name)
        .bind(position)
        .bind(role.as_str())
        .fetch_one(self.database.database_pool())
        .await
        .with_context(|| format!("failed to insert user {username}"))
    }
}

#[cfg(test)]
mod tests {
    use doctrack_common::test_utils::{TEST_PASSWORD_ROUNDS, memory_database};
    use doctrack_common::verify_password;

    use super::*;
    use crate::domain::accounts::{AdminAccount, AdminOutcome, create_admin};

    fn account(password: &str) -> AdminAccount {
        AdminAccount::new(
            "admin",
            password.to_string(),
            "Quản trị viên".to_string(),
            "System Admin".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn admin_is_created_once() {
        let database = memory_database().await;
        let accounts = AccountsAdapter::new(database.clone());

        let outcome = create_admin(&accounts, account("first"), TEST_PASSWORD_ROUNDS)
            .await
            .unwrap();
        assert!(matches!(outcome, AdminOutcome::Created(_)));

        let outcome = create_admin(&accounts, account("second"), TEST_PASSWORD_ROUNDS)
            .await
            .unwrap();
        assert_eq!(outcome, AdminOutcome::AlreadyExists);

        let (hash, role): (String, String) =
            sqlx::query_as("SELECT password_hash, role FROM users WHERE username = 'admin'")
                .fetch_one(database.database_pool())
                .await
                .unwrap();
        assert_eq!(role, "admin");
        assert!(verify_password("first", &hash));
    }
}
