//! Selectable fields for the student listing
//!
//! Each entry pairs a SQL expression with the alias it is exposed (and
//! sorted) under. Sort requests are resolved against the aliases only.

use crate::error::{StudentError, StudentResult};

/// One selectable expression and its output alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogField {
    pub expression: &'static str,
    pub alias: &'static str,
}

impl CatalogField {
    const fn new(expression: &'static str, alias: &'static str) -> Self {
        Self { expression, alias }
    }

    /// `expression AS alias`
    pub fn to_sql(&self) -> String {
        format!("{} AS {}", self.expression, self.alias)
    }
}

/// FROM source for the student listing
pub const STUDENT_SOURCE: &str = "student s";

/// Fields exposed by the student listing, in projection order.
pub const STUDENT_CATALOG: &[CatalogField] = &[
    CatalogField::new("s.id", "id"),
    CatalogField::new("s.created_at", "created_at"),
    CatalogField::new("s.fullname", "fullname"),
    CatalogField::new("s.sat_score", "sat_score"),
    CatalogField::new("s.graduation_score", "graduation_score"),
    CatalogField::new("s.phone", "phone"),
    CatalogField::new("s.email", "email"),
    CatalogField::new("s.picture", "picture"),
    CatalogField::new(
        "(SELECT avg(sg.course_score) FROM student_grade sg WHERE sg.student_id = s.id)",
        "avg_score",
    ),
];

/// Comma-separated projection list for a catalog
pub fn select_list(fields: &[CatalogField]) -> String {
    fields
        .iter()
        .map(CatalogField::to_sql)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the catalog entry whose alias matches `name`, ignoring case.
pub fn resolve_sort_field(
    fields: &'static [CatalogField],
    name: &str,
) -> StudentResult<&'static CatalogField> {
    let name = name.trim();
    fields
        .iter()
        .find(|field| field.alias.eq_ignore_ascii_case(name))
        .ok_or_else(|| StudentError::InvalidSortField {
            field: name.to_string(),
        })
}
