//! Offset pagination over a [`SelectQuery`]
//!
//! Validates the page request and sort field up front, then issues exactly
//! two queries: a COUNT over the filtered source and the page itself.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection};

use super::builder::SelectQuery;
use super::catalog::resolve_sort_field;
use super::predicate::SqlValue;
use crate::error::{StudentError, StudentResult};

/// Sort direction for ORDER BY clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest-newest)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest-oldest)
    Desc,
}

impl SortDirection {
    /// Parse a direction leniently. Anything other than `desc` sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    /// Convert to SQL order string
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Requested sort: a listing alias and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Build from raw request values, defaulting the direction to ascending
    pub fn from_params(field: impl Into<String>, direction: Option<&str>) -> Self {
        Self::new(field, SortDirection::parse(direction))
    }
}

/// A 1-based page number and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub count: u32,
}

impl PageRequest {
    pub fn new(page: u32, count: u32) -> Self {
        Self { page, count }
    }

    /// Fill missing values: page 1, and `default_count` rows per page
    pub fn from_params(page: Option<u32>, count: Option<u32>, default_count: u32) -> Self {
        Self::new(page.unwrap_or(1), count.unwrap_or(default_count))
    }

    pub fn validate(&self) -> StudentResult<()> {
        if self.count == 0 {
            return Err(StudentError::InvalidPageSize { count: self.count });
        }
        if self.page == 0 {
            return Err(StudentError::InvalidPageNumber { page: self.page });
        }
        Ok(())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.count)
    }

    /// Rows to skip. Saturates at `i64::MAX`, which SQLite reads as past the end.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1)
            .max(0)
            .checked_mul(i64::from(self.count))
            .unwrap_or(i64::MAX)
    }
}

/// One page of results plus the metadata needed to page through the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filters across all pages
    pub total: i64,
    pub page: u32,
    pub count: u32,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn has_next_page(&self) -> bool {
        i64::from(self.page) < self.total_pages
    }
}

/// `ceil(total / count)`; `count` must be non-zero.
pub fn total_pages(total: i64, count: u32) -> i64 {
    let count = i64::from(count);
    (total + count - 1) / count
}

/// Run `query` and return the requested page sorted by `sort`.
pub async fn fetch_page<T>(
    conn: &mut SqliteConnection,
    query: &SelectQuery,
    sort: &SortSpec,
    page: PageRequest,
) -> StudentResult<Page<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    page.validate()?;
    let sort_field = resolve_sort_field(query.fields, &sort.field)?;

    let predicate = query.compile_predicate();

    let count_sql = query.build_count_sql(&predicate);
    tracing::debug!(sql = %count_sql, "Executing count query");
    let total = sqlx::query_scalar_with::<_, i64, _>(&count_sql, predicate.arguments()?)
        .fetch_one(&mut *conn)
        .await?;

    let page_sql = query.build_page_sql(&predicate, sort_field, sort.direction);
    tracing::debug!(sql = %page_sql, page = page.page, count = page.count, "Executing page query");
    let mut args = predicate.arguments()?;
    SqlValue::Int(page.limit()).add_to(&mut args)?;
    SqlValue::Int(page.offset()).add_to(&mut args)?;
    let items = sqlx::query_as_with::<_, T, _>(&page_sql, args)
        .fetch_all(&mut *conn)
        .await?;

    Ok(Page {
        items,
        total,
        page: page.page,
        count: page.count,
        total_pages: total_pages(total, page.count),
    })
}
