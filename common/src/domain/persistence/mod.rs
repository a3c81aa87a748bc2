//! Schema of the document store and the additive migration planner.
//!
//! Migration never drops or rewrites anything: missing tables are created and
//! missing columns are appended to existing tables.

use anyhow::{Context, bail};

use crate::database::{Database, SchemaSnapshot};
use crate::domain::status::DocumentStatus;
use crate::domain::persistence::tables::{Column, ColumnType, Table};
use crate::{
    COMPLETION_TIME_FIELD_NAME, COUNTRY_FIELD_NAME, CREATED_FIELD_NAME, CREATION_DATE_FIELD_NAME,
    DOCUMENTS_TABLE_NAME, FULL_NAME_FIELD_NAME, HANDLER_ID_FIELD_NAME, ID_FIELD_NAME,
    IMPLEMENTER_ID_FIELD_NAME, STATUS_FIELD_NAME, TITLE_FIELD_NAME, USERNAME_FIELD_NAME,
    USERS_TABLE_NAME,
};

pub mod tables;

const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Tables the application needs, in creation order
pub fn application_tables() -> Vec<Table> {
    vec![users_table(), documents_table()]
}

fn users_table() -> Table {
    Table::new(USERS_TABLE_NAME)
        .column(Column::primary_key(ID_FIELD_NAME))
        .column(Column::new(USERNAME_FIELD_NAME, ColumnType::Text).not_null().unique())
        .column(Column::new("password_hash", ColumnType::Text).not_null())
        .column(Column::new(FULL_NAME_FIELD_NAME, ColumnType::Text).not_null())
        .column(Column::new("position", ColumnType::Text))
        .column(
            Column::new("role", ColumnType::Text)
                .not_null()
                .default_value("'staff'"),
        )
        .column(Column::new("avatar_path", ColumnType::Text))
        .column(
            Column::new(CREATED_FIELD_NAME, ColumnType::Text)
                .not_null()
                .default_value(CURRENT_TIMESTAMP),
        )
}

fn documents_table() -> Table {
    Table::new(DOCUMENTS_TABLE_NAME)
        .column(Column::primary_key(ID_FIELD_NAME))
        .column(Column::new(TITLE_FIELD_NAME, ColumnType::Text).not_null())
        .column(Column::new("authoring_agency", ColumnType::Text))
        .column(Column::new(COUNTRY_FIELD_NAME, ColumnType::Text))
        .column(Column::new(CREATION_DATE_FIELD_NAME, ColumnType::Text))
        .column(Column::new("source_type", ColumnType::Text))
        .column(Column::new("confidentiality_level", ColumnType::Text))
        .column(Column::new("urgency_level", ColumnType::Text))
        .column(Column::new("original_file_path", ColumnType::Text))
        .column(Column::new("translated_file_path", ColumnType::Text))
        .column(Column::new("original_text", ColumnType::Text))
        .column(Column::new("translated_text", ColumnType::Text))
        .column(Column::new("main_content_summary", ColumnType::Text))
        .column(Column::new(HANDLER_ID_FIELD_NAME, ColumnType::Integer))
        .column(Column::new(IMPLEMENTER_ID_FIELD_NAME, ColumnType::Integer))
        .column(
            Column::new(STATUS_FIELD_NAME, ColumnType::Text)
                .not_null()
                .default_value("'unassigned'"),
        )
        .column(Column::new(COMPLETION_TIME_FIELD_NAME, ColumnType::Text))
        .column(Column::new("week_number", ColumnType::Integer))
        .column(Column::new("year_number", ColumnType::Integer))
        .column(Column::new("notes", ColumnType::Text))
        .column(
            Column::new(CREATED_FIELD_NAME, ColumnType::Text)
                .not_null()
                .default_value(CURRENT_TIMESTAMP),
        )
        .foreign_key(HANDLER_ID_FIELD_NAME, USERS_TABLE_NAME)
        .foreign_key(IMPLEMENTER_ID_FIELD_NAME, USERS_TABLE_NAME)
        .index(&[STATUS_FIELD_NAME], false)
        .index(&[HANDLER_ID_FIELD_NAME], false)
        .index(&[CREATED_FIELD_NAME], false)
}

/// One unit of schema change, applied in its own transaction
#[derive(Debug, Clone)]
pub enum MigrationStep {
    CreateTable(Table),
    AddColumn { table_name: String, column: Column },
}

impl MigrationStep {
    pub fn ctx(&self) -> &'static str {
        match self {
            MigrationStep::CreateTable(_) => "CREATE TABLE",
            MigrationStep::AddColumn { .. } => "ADD COLUMN",
        }
    }

    pub fn ddls(&self) -> Vec<String> {
        match self {
            MigrationStep::CreateTable(table) => table.create_ddls(),
            MigrationStep::AddColumn { table_name, column } => column.add_ddls(table_name),
        }
    }
}

/// Compares the needed tables with the actual schema
pub fn migration_steps(
    needed: Vec<Table>,
    actual: &SchemaSnapshot,
) -> Result<Vec<MigrationStep>, anyhow::Error> {
    let mut steps = Vec::new();

    for table in needed {
        let Some(actual_columns) = actual.get(&table.name) else {
            steps.push(MigrationStep::CreateTable(table));
            continue;
        };

        for column in table.columns.iter() {
            if actual_columns.contains(&column.name) {
                continue;
            }
            if !column.can_be_added() {
                bail!(
                    "column {}.{} is missing and cannot be added to existing rows",
                    table.name,
                    column.name
                );
            }
            steps.push(MigrationStep::AddColumn {
                table_name: table.name.clone(),
                column: column.clone(),
            });
        }
    }

    Ok(steps)
}

/// Brings the database up to the application schema, returns the number of applied steps
pub async fn migrate(database: &Database) -> Result<usize, anyhow::Error> {
    let actual = database.load_schema().await?;
    let steps = migration_steps(application_tables(), &actual)?;
    let applied = steps.len();

    for step in steps {
        database.execute_in_transaction(step.ddls(), step.ctx()).await?;
    }

    if applied > 0 {
        tracing::info!("applied {} schema migration steps", applied);
    }

    normalize_statuses(database).await?;
    Ok(applied)
}

/// Rewrites statuses stored as display labels to their keys, so filters,
/// stats and guards only ever compare keys
async fn normalize_statuses(database: &Database) -> Result<u64, anyhow::Error> {
    let sql = format!(
        "UPDATE \"{DOCUMENTS_TABLE_NAME}\" SET \"{STATUS_FIELD_NAME}\" = ? WHERE \"{STATUS_FIELD_NAME}\" = ?"
    );

    let mut updated = 0;
    for status in DocumentStatus::ALL {
        updated += sqlx::query(&sql)
            .bind(status.key())
            .bind(status.label())
            .execute(database.database_pool())
            .await
            .with_context(|| format!("failed to normalize {} statuses", status.key()))?
            .rows_affected();
    }

    if updated > 0 {
        tracing::info!("rewrote {} document statuses from labels to keys", updated);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn columns(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn empty_database_creates_all_tables() {
        let steps = migration_steps(application_tables(), &SchemaSnapshot::new()).unwrap();
        let created = steps
            .iter()
            .filter_map(|step| match step {
                MigrationStep::CreateTable(table) => Some(table.name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(created, vec![USERS_TABLE_NAME, DOCUMENTS_TABLE_NAME]);
    }

    #[test]
    fn missing_optional_columns_are_added() {
        let mut actual = SchemaSnapshot::new();
        let users = users_table();
        actual.insert(
            USERS_TABLE_NAME.to_string(),
            users.columns.iter().map(|c| c.name.clone()).collect(),
        );
        let documents = documents_table();
        let legacy = documents
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !["week_number", "year_number", "notes"].contains(name))
            .collect::<Vec<_>>();
        actual.insert(DOCUMENTS_TABLE_NAME.to_string(), columns(&legacy));

        let steps = migration_steps(application_tables(), &actual).unwrap();
        let ddls = steps.iter().flat_map(|s| s.ddls()).collect::<Vec<_>>();
        assert_eq!(
            ddls,
            vec![
                "ALTER TABLE \"documents\" ADD COLUMN \"week_number\" INTEGER",
                "ALTER TABLE \"documents\" ADD COLUMN \"year_number\" INTEGER",
                "ALTER TABLE \"documents\" ADD COLUMN \"notes\" TEXT",
            ]
        );
    }

    #[test]
    fn required_column_cannot_be_added() {
        let mut actual = SchemaSnapshot::new();
        actual.insert(USERS_TABLE_NAME.to_string(), columns(&["id"]));
        assert!(migration_steps(vec![users_table()], &actual).is_err());
    }

    #[test]
    fn missing_created_at_is_backfilled() {
        let mut actual = SchemaSnapshot::new();
        let table = users_table();
        let legacy = table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| *name != CREATED_FIELD_NAME)
            .collect::<Vec<_>>();
        actual.insert(USERS_TABLE_NAME.to_string(), columns(&legacy));

        let steps = migration_steps(vec![users_table()], &actual).unwrap();
        let ddls = steps.iter().flat_map(|s| s.ddls()).collect::<Vec<_>>();
        assert_eq!(ddls.len(), 3);
        assert_eq!(ddls[0], "ALTER TABLE \"users\" ADD COLUMN \"created_at\" TEXT");
    }

    #[tokio::test]
    async fn populated_legacy_tables_are_migrated() {
        let database = crate::test_utils::empty_memory_database().await;
        let pool = database.database_pool();
        sqlx::query(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                full_name TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO users (username, password_hash, full_name) VALUES ('old', 'x', 'Old')",
        )
        .execute(pool)
        .await
        .unwrap();

        assert!(migrate(&database).await.unwrap() > 0);

        sqlx::query(
            "INSERT INTO users (username, password_hash, full_name) VALUES ('new', 'x', 'New')",
        )
        .execute(pool)
        .await
        .unwrap();
        let rows: Vec<(String, Option<String>, String)> =
            sqlx::query_as("SELECT username, created_at, role FROM users ORDER BY id")
                .fetch_all(pool)
                .await
                .unwrap();
        assert_eq!(rows.len(), 2);
        for (username, created_at, role) in rows {
            assert!(created_at.is_some(), "{username} has no created_at");
            assert_eq!(role, "staff");
        }

        assert_eq!(migrate(&database).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn label_statuses_are_rewritten_to_keys() {
        let database = crate::test_utils::memory_database().await;
        let pool = database.database_pool();
        for status in ["Đã xử lý", "Đang xử lý", "unassigned"] {
            sqlx::query("INSERT INTO documents (title, status) VALUES ('t', ?)")
                .bind(status)
                .execute(pool)
                .await
                .unwrap();
        }

        migrate(&database).await.unwrap();

        let statuses: Vec<String> = sqlx::query_scalar("SELECT status FROM documents ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap();
        assert_eq!(statuses, vec!["completed", "processing", "unassigned"]);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let database = crate::test_utils::memory_database().await;
        assert_eq!(migrate(&database).await.unwrap(), 0);

        let schema = database.load_schema().await.unwrap();
        assert!(schema[DOCUMENTS_TABLE_NAME].contains("week_number"));
        assert!(schema[USERS_TABLE_NAME].contains("avatar_path"));
    }
}
