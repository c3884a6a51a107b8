//! Student records backend core
//!
//! Create, update, fetch and delete student records, plus a filtered,
//! sorted and paginated listing with a derived average grade. Transport,
//! authentication and process bootstrapping live with the caller.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;

pub use config::{Config, LogFormat};
pub use db::{Database, Student, StudentFields, StudentListItem, StudentRepository, UnitOfWork};
pub use error::{StudentError, StudentResult};
pub use query::{Page, PageRequest, SortDirection, SortSpec, StudentFilter};
