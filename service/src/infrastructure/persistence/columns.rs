use doctrack_common::{
    COMPLETION_TIME_FIELD_NAME, COUNTRY_FIELD_NAME, CREATED_FIELD_NAME, CREATION_DATE_FIELD_NAME,
    DOCUMENTS_TABLE_NAME, FULL_NAME_FIELD_NAME, HANDLER_ID_FIELD_NAME, ID_FIELD_NAME,
    IMPLEMENTER_ID_FIELD_NAME, STATUS_FIELD_NAME, TITLE_FIELD_NAME, USERS_TABLE_NAME,
};

use crate::infrastructure::persistence::schema::{Column, Table};

pub const DOCUMENTS_TABLE: Table<'static> = Table {
    name: DOCUMENTS_TABLE_NAME,
    alias: "d",
};
pub const HANDLERS_TABLE: Table<'static> = Table {
    name: USERS_TABLE_NAME,
    alias: "h",
};
pub const IMPLEMENTERS_TABLE: Table<'static> = Table {
    name: USERS_TABLE_NAME,
    alias: "i",
};

/// Document columns

pub const ID_COLUMN: Column<'static> = Column::new("d", ID_FIELD_NAME);
pub const TITLE_COLUMN: Column<'static> = Column::new("d", TITLE_FIELD_NAME);
pub const AUTHORING_AGENCY_COLUMN: Column<'static> = Column::new("d", "authoring_agency");
pub const COUNTRY_COLUMN: Column<'static> = Column::new("d", COUNTRY_FIELD_NAME);
pub const CREATION_DATE_COLUMN: Column<'static> = Column::new("d", CREATION_DATE_FIELD_NAME);
pub const SOURCE_TYPE_COLUMN: Column<'static> = Column::new("d", "source_type");
pub const CONFIDENTIALITY_LEVEL_COLUMN: Column<'static> =
    Column::new("d", "confidentiality_level");
pub const URGENCY_LEVEL_COLUMN: Column<'static> = Column::new("d", "urgency_level");
pub const STATUS_COLUMN: Column<'static> = Column::new("d", STATUS_FIELD_NAME);
pub const HANDLER_ID_COLUMN: Column<'static> = Column::new("d", HANDLER_ID_FIELD_NAME);
pub const IMPLEMENTER_ID_COLUMN: Column<'static> = Column::new("d", IMPLEMENTER_ID_FIELD_NAME);
pub const COMPLETION_TIME_COLUMN: Column<'static> = Column::new("d", COMPLETION_TIME_FIELD_NAME);
pub const WEEK_NUMBER_COLUMN: Column<'static> = Column::new("d", "week_number");
pub const YEAR_NUMBER_COLUMN: Column<'static> = Column::new("d", "year_number");
pub const ORIGINAL_FILE_PATH_COLUMN: Column<'static> = Column::new("d", "original_file_path");
pub const TRANSLATED_FILE_PATH_COLUMN: Column<'static> = Column::new("d", "translated_file_path");
pub const ORIGINAL_TEXT_COLUMN: Column<'static> = Column::new("d", "original_text");
pub const TRANSLATED_TEXT_COLUMN: Column<'static> = Column::new("d", "translated_text");
pub const SUMMARY_COLUMN: Column<'static> = Column::new("d", "main_content_summary");
pub const NOTES_COLUMN: Column<'static> = Column::new("d", "notes");
pub const CREATED_COLUMN: Column<'static> = Column::new("d", CREATED_FIELD_NAME);

/// Joined user columns

pub const HANDLER_JOIN_ID_COLUMN: Column<'static> = Column::new("h", ID_FIELD_NAME);
pub const HANDLER_NAME_COLUMN: Column<'static> =
    Column::new("h", FULL_NAME_FIELD_NAME).aliased("handler_name");
pub const IMPLEMENTER_JOIN_ID_COLUMN: Column<'static> = Column::new("i", ID_FIELD_NAME);
pub const IMPLEMENTER_NAME_COLUMN: Column<'static> =
    Column::new("i", FULL_NAME_FIELD_NAME).aliased("implementer_name");
