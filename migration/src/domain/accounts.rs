use anyhow::anyhow;
use doctrack_common::{Role, Username, hash_password};

/// Bootstrap admin taken from the command line
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub username: Username,
    pub password: String,
    pub full_name: String,
    pub position: String,
}

impl AdminAccount {
    pub fn new(
        username: &str,
        password: String,
        full_name: String,
        position: String,
    ) -> Result<Self, anyhow::Error> {
        let username =
            Username::try_new(username).map_err(|e| anyhow!("invalid admin username: {e}"))?;
        if password.is_empty() {
            return Err(anyhow!("admin password must not be empty"));
        }
        Ok(Self {
            username,
            password,
            full_name,
            position,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    Created(i64),
    AlreadyExists,
}

pub trait Accounts: Send + Sync + Clone + 'static {
    fn username_exists(&self, username: &str)
    -> impl Future<Output = Result<bool, anyhow::Error>> + Send;

    /// Inserts a user and returns its id
    fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        position: &str,
        role: Role,
    ) -> impl Future<Output = Result<i64, anyhow::Error>> + Send;
}

/// Creates the admin account once, an existing username is left untouched.
pub async fn create_admin(
    accounts: &impl Accounts,
    account: AdminAccount,
    rounds: u32,
) -> Result<AdminOutcome, anyhow::Error> {
    let username = account.username.as_ref();
    if accounts.username_exists(username).await? {
        return Ok(AdminOutcome::AlreadyExists);
    }

    let password = account.password;
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, rounds)).await??;

    let id = accounts
        .insert_user(
            username,
            &password_hash,
            &account.full_name,
            &account.position,
            Role::Admin,
        )
        .await?;
    Ok(AdminOutcome::Created(id))
}
