//! Database connection and operations

pub mod schema;
pub mod students;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::config::Config;
use crate::error::StudentResult;

pub use schema::{ColumnDef, STUDENT_GRADE_TABLE, STUDENT_TABLE, TableDef, ensure_schema};
pub use students::{
    Student, StudentFields, StudentListItem, StudentRepository, create_student, delete_student,
    get_student, list_students, record_grade, update_student,
};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    default_page_size: u32,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            default_page_size: Config::default().default_page_size,
        }
    }

    /// Page size used by listings that do not ask for one
    pub fn with_default_page_size(mut self, default_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    /// Connect using the pool settings from `config`
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = Self::connect(
            &config.database_url,
            config.max_connections,
            config.acquire_timeout,
        )
        .await?;
        Ok(db.with_default_page_size(config.default_page_size))
    }

    /// Create a new database connection pool.
    ///
    /// `url` may be a `sqlite:` URL or a bare file path; missing files are
    /// created. In-memory databases are pinned to a single connection that is
    /// never recycled, since each connection would otherwise see its own
    /// empty database.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let in_memory = is_memory_url(url);
        let options = connect_options(url)?;

        if !in_memory
            && let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .inspect_err(|e| tracing::warn!(url = %url, error = %e, "Database connection failed"))
            .with_context(|| format!("Failed to connect to database {}", url))?;

        tracing::info!(url = %url, in_memory, "Database connected");
        Ok(Self::new(pool))
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a unit of work on a pooled connection
    pub async fn begin(&self) -> StudentResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool).await
    }

    /// Get a student repository
    pub fn students(&self) -> StudentRepository {
        StudentRepository::new(self.pool.clone())
            .with_default_page_size(self.default_page_size)
    }

    /// Create missing tables
    pub async fn ensure_schema(&self) -> Result<()> {
        ensure_schema(&self.pool).await
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn connect_options(url: &str) -> Result<SqliteConnectOptions> {
    let url = if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite://{}", url)
    };

    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid database URL {}", url))?
        .create_if_missing(true)
        .foreign_keys(true);
    Ok(options)
}

/// One transacted interaction with the store.
///
/// Dropping a unit of work without calling [`commit`](Self::commit) rolls it
/// back, so every early return releases the connection with no partial
/// writes.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn begin(pool: &SqlitePool) -> StudentResult<Self> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }

    /// The connection every statement in this unit of work runs on
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> StudentResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> StudentResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
