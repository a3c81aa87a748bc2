//! Best-effort parsing of the loosely formatted timestamps users type into
//! documents, and the display/edit forms derived from them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

/// Formats tried in order after `T`/`Z` separators are normalized
const PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const FRACTIONAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
const DISPLAY_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";
const INPUT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const STORAGE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of parsing a free-text timestamp.
///
/// Parsing never fails: text that matches no known format is kept as
/// [`NormalizedDate::Raw`] and every formatter hands it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedDate {
    Parsed {
        value: NaiveDateTime,
        /// the source carried a time of day worth showing
        has_time: bool,
    },
    Raw(String),
}

impl NormalizedDate {
    pub fn parse(raw: &str) -> Self {
        match parse_loose(raw) {
            Some(value) => {
                let midnight = value.hour() == 0 && value.minute() == 0 && value.second() == 0;
                let has_time = !midnight || raw.contains(' ');
                Self::Parsed { value, has_time }
            }
            None => Self::Raw(raw.to_string()),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Parsed { value, .. } => Some(*value),
            Self::Raw(_) => None,
        }
    }

    /// `dd/mm/yyyy`, or `dd/mm/yyyy HH:MM` when the source had a time
    pub fn display(&self) -> String {
        match self {
            Self::Parsed { value, has_time: true } => {
                value.format(DISPLAY_DATETIME_FORMAT).to_string()
            }
            Self::Parsed { value, has_time: false } => value.format(DISPLAY_DATE_FORMAT).to_string(),
            Self::Raw(raw) => raw.clone(),
        }
    }

    /// `yyyy-mm-dd` for date pickers
    pub fn date_input(&self) -> String {
        match self {
            Self::Parsed { value, .. } => value.format(DATE_FORMAT).to_string(),
            Self::Raw(raw) => raw.clone(),
        }
    }

    /// `yyyy-mm-dd HH:MM` for date-time pickers
    pub fn datetime_input(&self) -> String {
        match self {
            Self::Parsed { value, .. } => value.format(INPUT_DATETIME_FORMAT).to_string(),
            Self::Raw(raw) => raw.clone(),
        }
    }

    /// Canonical text persisted in the store, readable by SQLite `strftime`.
    pub fn storage(&self) -> String {
        match self {
            Self::Parsed { value, has_time: true } => {
                value.format(STORAGE_DATETIME_FORMAT).to_string()
            }
            Self::Parsed { value, has_time: false } => value.format(DATE_FORMAT).to_string(),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

/// Display form of an optional stored timestamp, empty when absent.
pub fn display(raw: Option<&str>) -> String {
    raw.map(|raw| NormalizedDate::parse(raw).display())
        .unwrap_or_default()
}

/// Date picker form of an optional stored timestamp, empty when absent.
pub fn date_input(raw: Option<&str>) -> String {
    raw.map(|raw| NormalizedDate::parse(raw).date_input())
        .unwrap_or_default()
}

/// Date-time picker form of an optional stored timestamp, empty when absent.
pub fn datetime_input(raw: Option<&str>) -> String {
    raw.map(|raw| NormalizedDate::parse(raw).datetime_input())
        .unwrap_or_default()
}

fn parse_loose(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim().replace('T', " ").replace('Z', "");
    if text.is_empty() {
        return None;
    }

    PARSE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .or_else(|| parse_iso_fallback(&text))
}

// offsets are dropped without conversion, the wall-clock fields are kept
fn parse_iso_fallback(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, FRACTIONAL_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_str(text, OFFSET_FORMAT)
                .ok()
                .map(|value| value.naive_local())
        })
}
