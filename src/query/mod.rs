//! Student listing query layer
//!
//! Provides the pieces that turn listing arguments into SQL:
//! - the field catalog (selectable expressions and their aliases)
//! - the predicate tree, compiled to parameterized SQL
//! - the filter builder producing a [`SelectQuery`]
//! - offset pagination with a count query and a page envelope
//!
//! ```rust,ignore
//! use student_records::query::{PageRequest, SortSpec, StudentFilter};
//!
//! let filter = StudentFilter {
//!     sat_score_from: Some(1400),
//!     sat_score_to: Some(1600),
//!     ..Default::default()
//! };
//! let page = fetch_page::<StudentListItem>(
//!     uow.connection(),
//!     &filter.to_query(),
//!     &SortSpec::desc("sat_score"),
//!     PageRequest::new(1, 20),
//! )
//! .await?;
//! ```

mod builder;
pub mod catalog;
mod paginate;
mod predicate;

pub use builder::*;
pub use catalog::{CatalogField, STUDENT_CATALOG, STUDENT_SOURCE, resolve_sort_field};
pub use paginate::*;
pub use predicate::*;
