use doctrack_common::{connect_to_database, domain::persistence::migrate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::AppStateImpl;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::persistence::documents::SqliteDocumentRepository;
use crate::infrastructure::persistence::users::SqliteUserRepository;
use crate::infrastructure::settings::Settings;
use crate::infrastructure::storage::UploadStorage;

mod domain;
mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = connect_to_database(&settings.database).await?;
    tracing::info!("connected to {}", settings.database.url);

    migrate(&database).await?;

    let attachments = UploadStorage::new(&settings.uploads.directory).await?;
    let state = AppStateImpl::new(
        SqliteDocumentRepository::new(database.clone()),
        SqliteUserRepository::new(database),
        attachments,
        settings.security.password_rounds,
    );

    let server_config = HttpServerConfig {
        port: &settings.server_port,
        max_body_bytes: settings.uploads.max_upload_bytes,
    };
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
