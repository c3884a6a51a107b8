//! Student listing query builder
//!
//! Turns a [`StudentFilter`] into a [`SelectQuery`]: the projection, the FROM
//! source, a predicate holding only the filters that are present, and the
//! named parameters for every filter.

use chrono::NaiveDate;
use serde::Deserialize;

use super::catalog::{CatalogField, STUDENT_CATALOG, STUDENT_SOURCE, select_list};
use super::paginate::SortDirection;
use super::predicate::{CompiledPredicate, ComparisonOp, Predicate, QueryParams};

/// Optional filters for listing students. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StudentFilter {
    /// Case-insensitive substring of the full name
    pub fullname: Option<String>,
    pub sat_score_from: Option<i64>,
    pub sat_score_to: Option<i64>,
    pub birthdate_from: Option<NaiveDate>,
    pub birthdate_to: Option<NaiveDate>,
}

impl StudentFilter {
    /// Check if the filter has any conditions
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none()
            && self.sat_score_from.is_none()
            && self.sat_score_to.is_none()
            && self.birthdate_from.is_none()
            && self.birthdate_to.is_none()
    }

    /// Build the listing query for this filter.
    pub fn to_query(&self) -> SelectQuery {
        let mut predicate = Predicate::Always;

        if self.fullname.is_some() {
            predicate = predicate.and(Predicate::comparison(
                "s.fullname",
                ComparisonOp::ContainsIgnoreCase,
                "fullname",
            ));
        }
        if self.sat_score_from.is_some() {
            predicate = predicate.and(Predicate::comparison(
                "s.sat_score",
                ComparisonOp::Gte,
                "sat_score_from",
            ));
        }
        if self.sat_score_to.is_some() {
            predicate = predicate.and(Predicate::comparison(
                "s.sat_score",
                ComparisonOp::Lte,
                "sat_score_to",
            ));
        }
        if self.birthdate_from.is_some() {
            predicate = predicate.and(Predicate::comparison(
                "s.birthdate",
                ComparisonOp::Gte,
                "birthdate_from",
            ));
        }
        if self.birthdate_to.is_some() {
            predicate = predicate.and(Predicate::comparison(
                "s.birthdate",
                ComparisonOp::Lte,
                "birthdate_to",
            ));
        }

        let mut params = QueryParams::new();
        params.insert("fullname", self.fullname.clone());
        params.insert("sat_score_from", self.sat_score_from);
        params.insert("sat_score_to", self.sat_score_to);
        params.insert("birthdate_from", self.birthdate_from);
        params.insert("birthdate_to", self.birthdate_to);

        SelectQuery {
            fields: STUDENT_CATALOG,
            source: STUDENT_SOURCE,
            predicate,
            params,
        }
    }
}

/// A parameterized SELECT description.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub fields: &'static [CatalogField],
    pub source: &'static str,
    pub predicate: Predicate,
    pub params: QueryParams,
}

impl SelectQuery {
    pub fn compile_predicate(&self) -> CompiledPredicate {
        self.predicate.compile(&self.params)
    }

    /// Build a COUNT query string over the same source and predicate.
    pub fn build_count_sql(&self, predicate: &CompiledPredicate) -> String {
        format!("SELECT COUNT(*) FROM {} WHERE {}", self.source, predicate.sql)
    }

    /// Build the page query string.
    ///
    /// LIMIT and OFFSET take the two placeholders after the predicate's.
    /// Rows tie-break on `id` so consecutive pages never overlap.
    pub fn build_page_sql(
        &self,
        predicate: &CompiledPredicate,
        sort: &CatalogField,
        direction: SortDirection,
    ) -> String {
        let mut order = format!("{} {}", sort.alias, direction.to_sql());
        if sort.alias != "id" {
            order.push_str(", id ASC");
        }

        let next = predicate.placeholder_count() + 1;
        format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            select_list(self.fields),
            self.source,
            predicate.sql,
            order,
            next,
            next + 1
        )
    }
}
