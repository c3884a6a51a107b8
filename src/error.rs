//! Error taxonomy for student operations
//!
//! Business-rule outcomes (`Conflict`, `NotFound`) and input validation
//! failures are returned as values. Storage failures are wrapped unchanged.

use thiserror::Error;

pub type StudentResult<T> = std::result::Result<T, StudentError>;

#[derive(Debug, Error)]
pub enum StudentError {
    /// A student with this email already exists
    #[error("student already exists: {email}")]
    Conflict { email: String },

    /// No student with this id
    #[error("student not found: {id}")]
    NotFound { id: i64 },

    /// Sort field is not one of the listing aliases
    #[error("invalid sort field '{field}'")]
    InvalidSortField { field: String },

    /// Page size must be at least 1
    #[error("invalid page size {count}: must be at least 1")]
    InvalidPageSize { count: u32 },

    /// Pages are numbered from 1
    #[error("invalid page number {page}: pages start at 1")]
    InvalidPageNumber { page: u32 },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StudentError {
    /// Status code the transport layer reports for this outcome.
    ///
    /// `NotFound` shares 409 with `Conflict`, matching what existing clients
    /// of the student service expect.
    pub fn http_status(&self) -> u16 {
        match self {
            StudentError::Conflict { .. } | StudentError::NotFound { .. } => 409,
            StudentError::InvalidSortField { .. }
            | StudentError::InvalidPageSize { .. }
            | StudentError::InvalidPageNumber { .. } => 400,
            StudentError::Storage(_) => 500,
        }
    }
}
