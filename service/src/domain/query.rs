//! Normalization of list requests and the pagination window.
//!
//! Nothing here fails: malformed filter input drops the filter, malformed
//! pagination input falls back to defaults.

use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

use crate::domain::document::DocumentSummary;
use crate::domain::document::lifecycle::DocumentStatus;
use crate::domain::repository::{DocumentRepository, RepositoryError};

pub const ALLOWED_PAGE_SIZES: [i64; 5] = [5, 10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// `handler_id` value selecting documents without a handler
pub const UNASSIGNED_HANDLER: &str = "null";

/// Raw list parameters exactly as received
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub week: Option<String>,
    pub year: Option<String>,
    pub handler_id: Option<String>,
    pub page_size: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerFilter {
    Unassigned,
    Assigned(i64),
}

/// Filters that survived normalization, each one AND-ed into the query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of the country
    pub country: Option<String>,
    pub status: Option<DocumentStatus>,
    /// Two digit, Monday-first week of the creation date
    pub week: Option<String>,
    /// Four digit year of the creation date
    pub year: Option<String>,
    pub handler: Option<HandlerFilter>,
}

/// Filter values sent back with the list so a client can refill its form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterEcho {
    pub q: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub week: Option<String>,
    pub year: Option<String>,
    pub handler_id: Option<String>,
    pub page_size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentListQuery {
    pub filter: DocumentFilter,
    pub page_size: i64,
    pub requested_page: i64,
    pub echo: FilterEcho,
}

impl From<ListParams> for DocumentListQuery {
    fn from(params: ListParams) -> Self {
        let q = text(params.q);
        let country = text(params.country);
        let status = text(params.status);
        let week = text(params.week).and_then(|week| padded(&week, 2));
        let year = text(params.year).and_then(|year| padded(&year, 4));
        let handler_id = text(params.handler_id);

        let handler = handler_id.as_deref().and_then(|handler_id| {
            if handler_id == UNASSIGNED_HANDLER {
                Some(HandlerFilter::Unassigned)
            } else {
                parse_int(handler_id).map(HandlerFilter::Assigned)
            }
        });

        let page_size = params
            .page_size
            .as_deref()
            .and_then(parse_int)
            .filter(|size| ALLOWED_PAGE_SIZES.contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let requested_page = params
            .page
            .as_deref()
            .and_then(parse_int)
            .unwrap_or(DEFAULT_PAGE)
            .max(1);

        let filter = DocumentFilter {
            title: q.clone(),
            country: country.clone(),
            status: status.as_deref().and_then(DocumentStatus::parse),
            week: week.clone(),
            year: year.clone(),
            handler,
        };

        let echo = FilterEcho {
            q,
            country,
            status,
            week,
            year,
            handler_id,
            page_size,
        };

        Self {
            filter,
            page_size,
            requested_page,
            echo,
        }
    }
}

/// Resolved page of a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub total_filtered: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
    #[serde(skip)]
    pub offset: i64,
}

impl PageWindow {
    /// There is always at least one page, and the requested page is clamped
    /// into `1..=total_pages`.
    pub fn compute(total_filtered: i64, page_size: i64, requested_page: i64) -> Self {
        let page_size = page_size.max(1);
        let total_filtered = total_filtered.max(0);
        let total_pages = ((total_filtered + page_size - 1) / page_size).max(1);
        let page = requested_page.clamp(1, total_pages);

        Self {
            total_filtered,
            total_pages,
            page,
            page_size,
            offset: (page - 1) * page_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub rows: Vec<DocumentSummary>,
    pub window: PageWindow,
    pub filters: FilterEcho,
}

/// Counts first so that an out of range page can be clamped before the rows
/// are fetched with the same filter.
pub async fn list_documents<R: DocumentRepository>(
    repository: &R,
    query: DocumentListQuery,
) -> Result<DocumentPage, RepositoryError> {
    let total = repository.count_documents(&query.filter).await?;
    let window = PageWindow::compute(total, query.page_size, query.requested_page);
    let rows = repository
        .find_documents(&query.filter, window.page_size, window.offset)
        .await?;

    tracing::debug!(
        total,
        page = window.page,
        rows = rows.len(),
        "listed documents"
    );

    Ok(DocumentPage {
        rows,
        window,
        filters: query.echo,
    })
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn padded(value: &str, width: usize) -> Option<String> {
    parse_int(value).map(|number| format!("{number:0width$}"))
}

/// Integer parsing that saturates instead of failing on overflow
fn parse_int(value: &str) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(number) => Some(number),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}
