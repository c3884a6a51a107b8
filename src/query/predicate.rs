//! Predicate tree and parameter binding
//!
//! Filters are assembled as a tree of comparisons and compiled to a WHERE
//! fragment with numbered SQLite placeholders (`?1`, `?2`, ...). User values
//! never end up in the SQL text; they travel as [`SqlValue`]s bound to the
//! query arguments.

use chrono::NaiveDate;
use sqlx::Arguments;
use sqlx::sqlite::SqliteArguments;

/// Represents a SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Append this value to a set of SQLite arguments
    pub fn add_to(&self, args: &mut SqliteArguments<'_>) -> Result<(), sqlx::Error> {
        let added = match self {
            SqlValue::String(s) => args.add(s.clone()),
            SqlValue::Int(i) => args.add(*i),
            SqlValue::Float(f) => args.add(*f),
            SqlValue::Date(d) => args.add(*d),
            SqlValue::Null => args.add(None::<String>),
        };
        added.map_err(sqlx::Error::Encode)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map(SqlValue::String).unwrap_or(SqlValue::Null)
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(value: Option<i64>) -> Self {
        value.map(SqlValue::Int).unwrap_or(SqlValue::Null)
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map(SqlValue::Date).unwrap_or(SqlValue::Null)
    }
}

/// Named query parameters, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(&'static str, SqlValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value under the same name
    pub fn insert(&mut self, name: &'static str, value: impl Into<SqlValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Comparison operators supported by the listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Case-insensitive substring match
    ContainsIgnoreCase,
    /// Inclusive lower bound
    Gte,
    /// Inclusive upper bound
    Lte,
}

impl ComparisonOp {
    fn to_sql(self, column: &str, placeholder: usize) -> String {
        match self {
            ComparisonOp::ContainsIgnoreCase => {
                format!("lower({}) LIKE lower(?{}) ESCAPE '\\'", column, placeholder)
            }
            ComparisonOp::Gte => format!("{} >= ?{}", column, placeholder),
            ComparisonOp::Lte => format!("{} <= ?{}", column, placeholder),
        }
    }

    /// Shape the raw parameter into the value actually bound
    fn bound_value(self, value: &SqlValue) -> SqlValue {
        match (self, value) {
            (ComparisonOp::ContainsIgnoreCase, SqlValue::String(s)) => {
                SqlValue::String(format!("%{}%", escape_like(s)))
            }
            _ => value.clone(),
        }
    }
}

/// Escape LIKE metacharacters so the value matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A WHERE-clause tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row
    Always,
    Comparison {
        column: &'static str,
        op: ComparisonOp,
        param: &'static str,
    },
    /// Conjunction, compiled in insertion order
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn comparison(column: &'static str, op: ComparisonOp, param: &'static str) -> Self {
        Predicate::Comparison { column, op, param }
    }

    /// Append `next` conjunctively
    pub fn and(self, next: Predicate) -> Self {
        match self {
            Predicate::Always => Predicate::And(vec![next]),
            Predicate::And(mut parts) => {
                parts.push(next);
                Predicate::And(parts)
            }
            other => Predicate::And(vec![other, next]),
        }
    }

    /// Names of the parameters this predicate references, in order
    pub fn referenced_params(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        self.collect_params(&mut names);
        names
    }

    fn collect_params(&self, names: &mut Vec<&'static str>) {
        match self {
            Predicate::Always => {}
            Predicate::Comparison { param, .. } => names.push(*param),
            Predicate::And(parts) => parts.iter().for_each(|p| p.collect_params(names)),
        }
    }

    /// Compile to SQL with placeholders numbered from 1.
    ///
    /// Only referenced parameters are bound. A referenced name missing from
    /// `params` binds NULL, which no comparison matches.
    pub fn compile(&self, params: &QueryParams) -> CompiledPredicate {
        let mut values = Vec::new();
        let sql = self.compile_into(params, &mut values);
        CompiledPredicate { sql, values }
    }

    fn compile_into(&self, params: &QueryParams, values: &mut Vec<SqlValue>) -> String {
        match self {
            Predicate::Always => "1 = 1".to_string(),
            Predicate::Comparison { column, op, param } => {
                debug_assert!(params.get(param).is_some(), "unknown parameter {param}");
                let raw = params.get(param).cloned().unwrap_or(SqlValue::Null);
                values.push(op.bound_value(&raw));
                op.to_sql(column, values.len())
            }
            Predicate::And(parts) if parts.is_empty() => "1 = 1".to_string(),
            Predicate::And(parts) => parts
                .iter()
                .map(|p| format!("({})", p.compile_into(params, values)))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }
}

/// A compiled WHERE fragment plus the values for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl CompiledPredicate {
    /// Number of placeholders used by the fragment
    pub fn placeholder_count(&self) -> usize {
        self.values.len()
    }

    /// Build the argument list for this fragment
    pub fn arguments<'q>(&self) -> Result<SqliteArguments<'q>, sqlx::Error> {
        let mut args = SqliteArguments::default();
        for value in &self.values {
            value.add_to(&mut args)?;
        }
        Ok(args)
    }
}
