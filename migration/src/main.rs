use clap::{Parser, Subcommand};
use doctrack_common::{DEFAULT_PASSWORD_ROUNDS, connect_to_database, domain::persistence::migrate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::accounts::{AdminAccount, AdminOutcome, create_admin};
use crate::infrastructure::accounts::AccountsAdapter;
use crate::infrastructure::settings::Settings;

pub mod domain;
pub mod infrastructure;

#[derive(Parser)]
#[command(name = "migration")]
#[command(about = "Schema migration and account bootstrap for the document tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables and columns
    Migrate,

    /// Migrate, then create the first admin account unless the username is taken
    CreateAdmin {
        #[arg(long, env = "ADMIN_USERNAME", default_value = "admin")]
        username: String,
        #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin")]
        password: String,
        #[arg(long, env = "ADMIN_FULL_NAME", default_value = "Quản trị viên")]
        full_name: String,
        #[arg(long, env = "ADMIN_POSITION", default_value = "System Admin")]
        position: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = connect_to_database(&settings.database).await?;
    tracing::info!("connected to {}", settings.database.url);

    let applied = migrate(&database).await?;
    tracing::info!("schema is up to date, {} steps applied", applied);

    if let Commands::CreateAdmin {
        username,
        password,
        full_name,
        position,
    } = cli.command
    {
        let account = AdminAccount::new(&username, password, full_name, position)?;
        let accounts = AccountsAdapter::new(database);
        match create_admin(&accounts, account, DEFAULT_PASSWORD_ROUNDS).await? {
            AdminOutcome::Created(id) => tracing::info!(id, %username, "admin account created"),
            AdminOutcome::AlreadyExists => {
                tracing::info!(%username, "user already exists, nothing to do")
            }
        }
    }

    Ok(())
}
