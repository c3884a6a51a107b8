//! Table definitions for the student store
//!
//! Generates `CREATE TABLE IF NOT EXISTS` statements from column
//! definitions so a fresh database (local dev, tests) can be brought up
//! without external tooling. Column renames and type changes are not handled.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Column definition for schema generation.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name in the database
    pub name: &'static str,
    /// SQLite column type (TEXT, INTEGER, REAL, BLOB)
    pub sql_type: &'static str,
    /// Whether the column can be NULL
    pub nullable: bool,
    /// Whether this is the primary key
    pub is_primary_key: bool,
    /// Foreign key target (e.g., "student(id)")
    pub references: Option<&'static str>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            is_primary_key: false,
            references: None,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn references(mut self, target: &'static str) -> Self {
        self.references = Some(target);
        self
    }

    /// Generate the column definition SQL
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);

        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }

        if !self.nullable && !self.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        if let Some(target) = self.references {
            sql.push_str(&format!(" REFERENCES {}", target));
        }

        sql
    }
}

/// A table and its columns.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Generate CREATE TABLE IF NOT EXISTS SQL
    pub fn create_table_sql(&self) -> String {
        let column_defs: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            self.name,
            column_defs.join(",\n  ")
        )
    }
}

pub const STUDENT_TABLE: TableDef = TableDef {
    name: "student",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("created_at", "TEXT"),
        ColumnDef::new("fullname", "TEXT"),
        ColumnDef::new("birthdate", "TEXT"),
        ColumnDef::new("sat_score", "INTEGER"),
        ColumnDef::new("graduation_score", "REAL"),
        ColumnDef::new("phone", "TEXT"),
        ColumnDef::new("email", "TEXT"),
        ColumnDef::new("picture", "TEXT").nullable(),
    ],
};

pub const STUDENT_GRADE_TABLE: TableDef = TableDef {
    name: "student_grade",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("student_id", "INTEGER").references("student(id)"),
        ColumnDef::new("course_score", "REAL"),
    ],
};

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_student_email ON student (email)",
    "CREATE INDEX IF NOT EXISTS idx_student_grade_student_id ON student_grade (student_id)",
];

/// Create the student tables and indexes if they are missing.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for table in [&STUDENT_TABLE, &STUDENT_GRADE_TABLE] {
        let create_sql = table.create_table_sql();
        debug!(table = table.name, sql = %create_sql, "Ensuring table");
        sqlx::query(&create_sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {}", table.name))?;
    }

    for index_sql in INDEXES {
        sqlx::query(index_sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create index: {}", index_sql))?;
    }

    Ok(())
}
