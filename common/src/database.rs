use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use futures::TryStreamExt;
use serde::Deserialize;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// Connection pool to the document store. Cloning is cheap: every clone hands
/// out connections from the same pool, and each statement returns its
/// connection when it completes.
#[derive(Clone, Debug)]
pub struct Database {
    database_pool: SqlitePool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection url, e.g. `sqlite://doctrack.db`
    pub url: String,
    pub connection: DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConnection {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Actual tables of the database with their column names
pub type SchemaSnapshot = HashMap<String, HashSet<String>>;

pub async fn connect(settings: &DatabaseSettings) -> Result<Database, anyhow::Error> {
    Database::new(settings).await
}

impl Database {
    async fn new(settings: &DatabaseSettings) -> Result<Self, anyhow::Error> {
        let connect_options = SqliteConnectOptions::from_str(&settings.url)
            .with_context(|| format!("invalid database url {}", settings.url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let connection = &settings.connection;
        let pool = SqlitePoolOptions::new()
            .min_connections(connection.min_connections)
            .max_connections(connection.max_connections)
            .acquire_timeout(Duration::from_secs(connection.acquire_timeout_seconds))
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open database at {}", settings.url))?;

        Ok(Self {
            database_pool: pool,
        })
    }

    pub fn from_pool(database_pool: SqlitePool) -> Self {
        Self { database_pool }
    }

    pub async fn execute_in_transaction(
        &self,
        queries: Vec<String>,
        ctx: &str,
    ) -> Result<(), anyhow::Error> {
        let mut transaction = self
            .database_pool
            .begin()
            .await
            .with_context(|| format!("failed to start {} transaction", ctx))?;

        tracing::info!("{}", ctx);

        for ddl in queries {
            tracing::debug!("{}", ddl);

            sqlx::query(&ddl)
                .execute(&mut *transaction)
                .await
                .with_context(|| format!("failed to execute {} query", ctx))?;
        }

        transaction
            .commit()
            .await
            .with_context(|| format!("failed to commit {} transaction", ctx))?;

        Ok(())
    }

    /// Loads table and column names of the user tables
    pub async fn load_schema(&self) -> Result<SchemaSnapshot, anyhow::Error> {
        let sql = "SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

        let mut rows = sqlx::query_scalar::<_, String>(sql).fetch(self.database_pool());

        let mut tables = Vec::new();
        while let Some(name) = rows.try_next().await? {
            tables.push(name);
        }
        drop(rows);

        let mut schema = SchemaSnapshot::new();
        for table in tables {
            let pragma = format!("PRAGMA table_info(\"{}\")", table);
            let columns = sqlx::query(&pragma)
                .fetch_all(self.database_pool())
                .await
                .with_context(|| format!("failed to read columns of {}", table))?
                .iter()
                .map(|row| row.try_get::<String, _>("name"))
                .collect::<Result<HashSet<_>, _>>()?;
            schema.insert(table, columns);
        }

        Ok(schema)
    }

    pub fn database_pool(&self) -> &SqlitePool {
        &self.database_pool
    }
}
