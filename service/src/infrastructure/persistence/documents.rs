use std::borrow::Cow;

use doctrack_common::Database;
use sqlx::Sqlite;

use crate::domain::document::lifecycle::{UserId, Workflow};
use crate::domain::document::{
    AttachmentKind, Document, DocumentContent, DocumentDetails, DocumentId, DocumentSummary,
    NewDocument,
};
use crate::domain::query::{DocumentFilter, HandlerFilter};
use crate::domain::repository::{DocumentRepository, RepositoryError, StoredAttachment};
use crate::infrastructure::persistence::columns::*;
use crate::infrastructure::persistence::parameters::{SqlParameter, into_arguments};
use crate::infrastructure::persistence::query::{Condition, QueryBuilder};
use crate::infrastructure::persistence::schema::Column;
use crate::infrastructure::persistence::{argument_error, database_error};

/// Monday-first week of year, 00-53
const WEEK_FORMAT: &str = "%W";
const YEAR_FORMAT: &str = "%Y";

const LIST_COLUMNS: [Column<'static>; 16] = [
    ID_COLUMN,
    TITLE_COLUMN,
    AUTHORING_AGENCY_COLUMN,
    COUNTRY_COLUMN,
    CREATION_DATE_COLUMN,
    SOURCE_TYPE_COLUMN,
    CONFIDENTIALITY_LEVEL_COLUMN,
    URGENCY_LEVEL_COLUMN,
    STATUS_COLUMN,
    HANDLER_ID_COLUMN,
    HANDLER_NAME_COLUMN,
    WEEK_NUMBER_COLUMN,
    YEAR_NUMBER_COLUMN,
    ORIGINAL_FILE_PATH_COLUMN,
    TRANSLATED_FILE_PATH_COLUMN,
    CREATED_COLUMN,
];

const DETAIL_COLUMNS: [Column<'static>; 23] = [
    ID_COLUMN,
    TITLE_COLUMN,
    AUTHORING_AGENCY_COLUMN,
    COUNTRY_COLUMN,
    CREATION_DATE_COLUMN,
    SOURCE_TYPE_COLUMN,
    CONFIDENTIALITY_LEVEL_COLUMN,
    URGENCY_LEVEL_COLUMN,
    STATUS_COLUMN,
    HANDLER_ID_COLUMN,
    HANDLER_NAME_COLUMN,
    IMPLEMENTER_ID_COLUMN,
    IMPLEMENTER_NAME_COLUMN,
    COMPLETION_TIME_COLUMN,
    WEEK_NUMBER_COLUMN,
    YEAR_NUMBER_COLUMN,
    ORIGINAL_FILE_PATH_COLUMN,
    TRANSLATED_FILE_PATH_COLUMN,
    ORIGINAL_TEXT_COLUMN,
    TRANSLATED_TEXT_COLUMN,
    SUMMARY_COLUMN,
    NOTES_COLUMN,
    CREATED_COLUMN,
];

#[derive(Clone, Debug)]
pub struct SqliteDocumentRepository {
    database: Database,
}

impl SqliteDocumentRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

/// One condition per filter that survived normalization
fn filter_conditions(filter: &DocumentFilter) -> Vec<Condition<'static>> {
    let mut conditions = Vec::new();

    if let Some(title) = &filter.title {
        conditions.push(Condition::Contains {
            column: Cow::Borrowed(&TITLE_COLUMN),
            value: title.clone(),
        });
    }
    if let Some(country) = &filter.country {
        conditions.push(Condition::Contains {
            column: Cow::Borrowed(&COUNTRY_COLUMN),
            value: country.clone(),
        });
    }
    if let Some(status) = filter.status {
        conditions.push(Condition::Equals {
            column: Cow::Borrowed(&STATUS_COLUMN),
            value: status.key().into(),
        });
    }
    if let Some(week) = &filter.week {
        conditions.push(Condition::Strftime {
            format: WEEK_FORMAT,
            column: Cow::Borrowed(&CREATION_DATE_COLUMN),
            value: week.clone(),
        });
    }
    if let Some(year) = &filter.year {
        conditions.push(Condition::Strftime {
            format: YEAR_FORMAT,
            column: Cow::Borrowed(&CREATION_DATE_COLUMN),
            value: year.clone(),
        });
    }
    match filter.handler {
        Some(HandlerFilter::Unassigned) => conditions.push(Condition::IsNull {
            column: Cow::Borrowed(&HANDLER_ID_COLUMN),
        }),
        Some(HandlerFilter::Assigned(id)) => conditions.push(Condition::Equals {
            column: Cow::Borrowed(&HANDLER_ID_COLUMN),
            value: id.into(),
        }),
        None => {}
    }

    conditions
}

fn list_query(filter: &DocumentFilter) -> QueryBuilder<'static> {
    QueryBuilder::from(DOCUMENTS_TABLE)
        .select(&LIST_COLUMNS)
        .left_join(HANDLERS_TABLE, &HANDLER_ID_COLUMN, &HANDLER_JOIN_ID_COLUMN)
        .where_conditions(filter_conditions(filter))
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentSummaryRecord {
    id: i64,
    title: String,
    authoring_agency: Option<String>,
    country: Option<String>,
    creation_date: Option<String>,
    source_type: Option<String>,
    confidentiality_level: Option<String>,
    urgency_level: Option<String>,
    status: String,
    handler_id: Option<i64>,
    handler_name: Option<String>,
    week_number: Option<i64>,
    year_number: Option<i64>,
    original_file_path: Option<String>,
    translated_file_path: Option<String>,
    created_at: String,
}

impl From<DocumentSummaryRecord> for DocumentSummary {
    fn from(record: DocumentSummaryRecord) -> Self {
        let status = Workflow::restore(&record.status, record.handler_id.map(UserId), None, None)
            .status();

        DocumentSummary {
            id: DocumentId(record.id),
            title: record.title,
            authoring_agency: record.authoring_agency,
            country: record.country,
            creation_date: record.creation_date,
            source_type: record.source_type,
            confidentiality_level: record.confidentiality_level,
            urgency_level: record.urgency_level,
            status,
            handler_id: record.handler_id,
            handler_name: record.handler_name,
            week_number: record.week_number,
            year_number: record.year_number,
            has_original_file: record.original_file_path.is_some(),
            has_translated_file: record.translated_file_path.is_some(),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentRecord {
    id: i64,
    title: String,
    authoring_agency: Option<String>,
    country: Option<String>,
    creation_date: Option<String>,
    source_type: Option<String>,
    confidentiality_level: Option<String>,
    urgency_level: Option<String>,
    status: String,
    handler_id: Option<i64>,
    handler_name: Option<String>,
    implementer_id: Option<i64>,
    implementer_name: Option<String>,
    completion_time: Option<String>,
    week_number: Option<i64>,
    year_number: Option<i64>,
    original_file_path: Option<String>,
    translated_file_path: Option<String>,
    original_text: Option<String>,
    translated_text: Option<String>,
    main_content_summary: Option<String>,
    notes: Option<String>,
    created_at: String,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        let workflow = Workflow::restore(
            &record.status,
            record.handler_id.map(UserId),
            record.implementer_id.map(UserId),
            record.completion_time,
        );

        Document {
            id: DocumentId(record.id),
            details: DocumentDetails {
                title: record.title,
                authoring_agency: record.authoring_agency,
                country: record.country,
                creation_date: record.creation_date,
                source_type: record.source_type,
                confidentiality_level: record.confidentiality_level,
                urgency_level: record.urgency_level,
                week_number: record.week_number,
                year_number: record.year_number,
                main_content_summary: record.main_content_summary,
                notes: record.notes,
            },
            content: DocumentContent {
                original_file_path: record.original_file_path,
                translated_file_path: record.translated_file_path,
                original_text: record.original_text,
                translated_text: record.translated_text,
            },
            workflow,
            handler_name: record.handler_name,
            implementer_name: record.implementer_name,
            created_at: record.created_at,
        }
    }
}

fn workflow_parameters(workflow: &Workflow) -> [SqlParameter; 4] {
    [
        workflow.status().key().into(),
        workflow.handler_id().map(|id| id.0).into(),
        workflow.implementer_id().map(|id| id.0).into(),
        workflow.completion_time().into(),
    ]
}

fn expect_one_row(rows_affected: u64) -> Result<(), RepositoryError> {
    match rows_affected {
        0 => Err(RepositoryError::NotFound),
        _ => Ok(()),
    }
}

impl SqliteDocumentRepository {
    async fn execute(
        &self,
        sql: &str,
        parameters: Vec<SqlParameter>,
        context: &str,
    ) -> Result<u64, RepositoryError> {
        let args = into_arguments(parameters).map_err(argument_error)?;
        sqlx::query_with::<Sqlite, _>(sql, args)
            .execute(self.database.database_pool())
            .await
            .map(|result| result.rows_affected())
            .map_err(|e| database_error(e, context))
    }
}

impl DocumentRepository for SqliteDocumentRepository {
    async fn count_documents(&self, filter: &DocumentFilter) -> Result<i64, RepositoryError> {
        let (sql, params) = list_query(filter).build_count();
        let args = into_arguments(params).map_err(argument_error)?;

        sqlx::query_scalar_with::<Sqlite, i64, _>(&sql, args)
            .fetch_one(self.database.database_pool())
            .await
            .map_err(|e| database_error(e, "failed to count documents"))
    }

    async fn find_documents(
        &self,
        filter: &DocumentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DocumentSummary>, RepositoryError> {
        let (sql, params) = list_query(filter)
            .order_by_desc(&CREATED_COLUMN)
            .order_by_desc(&ID_COLUMN)
            .limit(limit)
            .offset(offset)
            .build();
        let args = into_arguments(params).map_err(argument_error)?;

        let records = sqlx::query_as_with::<Sqlite, DocumentSummaryRecord, _>(&sql, args)
            .fetch_all(self.database.database_pool())
            .await
            .map_err(|e| database_error(e, "failed to list documents"))?;

        Ok(records.into_iter().map(DocumentSummary::from).collect())
    }

    async fn status_counts(&self) -> Result<Vec<(String, i64)>, RepositoryError> {
        sqlx::query_as::<Sqlite, (String, i64)>(
            "SELECT status, COUNT(*) FROM documents GROUP BY status",
        )
        .fetch_all(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "failed to count document statuses"))
    }

    async fn find_document(&self, id: DocumentId) -> Result<Document, RepositoryError> {
        let (sql, params) = QueryBuilder::from(DOCUMENTS_TABLE)
            .select(&DETAIL_COLUMNS)
            .left_join(HANDLERS_TABLE, &HANDLER_ID_COLUMN, &HANDLER_JOIN_ID_COLUMN)
            .left_join(
                IMPLEMENTERS_TABLE,
                &IMPLEMENTER_ID_COLUMN,
                &IMPLEMENTER_JOIN_ID_COLUMN,
            )
            .where_condition(Condition::Equals {
                column: Cow::Borrowed(&ID_COLUMN),
                value: id.0.into(),
            })
            .build();
        let args = into_arguments(params).map_err(argument_error)?;

        sqlx::query_as_with::<Sqlite, DocumentRecord, _>(&sql, args)
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(|e| database_error(e, "failed to load document"))?
            .map(Document::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_document(&self, document: NewDocument) -> Result<DocumentId, RepositoryError> {
        let NewDocument {
            details,
            content,
            workflow,
        } = document;

        let mut params: Vec<SqlParameter> = vec![
            details.title.into(),
            details.authoring_agency.into(),
            details.country.into(),
            details.creation_date.into(),
            details.source_type.into(),
            details.confidentiality_level.into(),
            details.urgency_level.into(),
            content.original_file_path.into(),
            content.translated_file_path.into(),
            content.original_text.into(),
            content.translated_text.into(),
            details.main_content_summary.into(),
            details.week_number.into(),
            details.year_number.into(),
            details.notes.into(),
        ];
        params.extend(workflow_parameters(&workflow));
        let args = into_arguments(params).map_err(argument_error)?;

        let id: i64 = sqlx::query_scalar_with::<Sqlite, i64, _>(
            "INSERT INTO documents (
                title, authoring_agency, country, creation_date,
                source_type, confidentiality_level, urgency_level,
                original_file_path, translated_file_path,
                original_text, translated_text, main_content_summary,
                week_number, year_number, notes,
                status, handler_id, implementer_id, completion_time
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
            args,
        )
        .fetch_one(self.database.database_pool())
        .await
        .map_err(|e| database_error(e, "handler does not exist"))?;

        tracing::info!(id, status = %workflow.status(), "document created");
        Ok(DocumentId(id))
    }

    async fn update_document(
        &self,
        id: DocumentId,
        details: &DocumentDetails,
        workflow: &Workflow,
    ) -> Result<(), RepositoryError> {
        let mut params: Vec<SqlParameter> = vec![
            details.title.as_str().into(),
            details.authoring_agency.as_deref().into(),
            details.country.as_deref().into(),
            details.creation_date.as_deref().into(),
            details.source_type.as_deref().into(),
            details.confidentiality_level.as_deref().into(),
            details.urgency_level.as_deref().into(),
            details.main_content_summary.as_deref().into(),
            details.week_number.into(),
            details.year_number.into(),
            details.notes.as_deref().into(),
        ];
        params.extend(workflow_parameters(workflow));
        params.push(id.0.into());

        let rows = self
            .execute(
                "UPDATE documents SET
                    title = ?, authoring_agency = ?, country = ?, creation_date = ?,
                    source_type = ?, confidentiality_level = ?, urgency_level = ?,
                    main_content_summary = ?, week_number = ?, year_number = ?, notes = ?,
                    status = ?, handler_id = ?, implementer_id = ?, completion_time = ?
                WHERE id = ?",
                params,
                "handler does not exist",
            )
            .await?;
        expect_one_row(rows)
    }

    async fn save_workflow(&self, id: DocumentId, workflow: &Workflow) -> Result<(), RepositoryError> {
        let mut params = workflow_parameters(workflow).to_vec();
        params.push(id.0.into());

        let rows = self
            .execute(
                "UPDATE documents SET
                    status = ?, handler_id = ?, implementer_id = ?, completion_time = ?
                WHERE id = ?",
                params,
                "user does not exist",
            )
            .await?;
        expect_one_row(rows)
    }

    async fn update_attachment(
        &self,
        id: DocumentId,
        kind: AttachmentKind,
        attachment: Option<&StoredAttachment>,
    ) -> Result<(), RepositoryError> {
        let sql = match kind {
            AttachmentKind::Original => {
                "UPDATE documents SET original_file_path = ?, original_text = ? WHERE id = ?"
            }
            AttachmentKind::Translated => {
                "UPDATE documents SET translated_file_path = ?, translated_text = ? WHERE id = ?"
            }
        };
        let params = vec![
            attachment.map(|a| a.path.as_str()).into(),
            attachment.map(|a| a.text.as_str()).into(),
            id.0.into(),
        ];

        let rows = self
            .execute(sql, params, "failed to update attachment")
            .await?;
        expect_one_row(rows)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let rows = self
            .execute(
                "DELETE FROM documents WHERE id = ?",
                vec![id.0.into()],
                "failed to delete document",
            )
            .await?;
        expect_one_row(rows)?;

        tracing::info!(id = id.0, "document deleted");
        Ok(())
    }
}
