//! Query builder: schema-aware search, filter and sort for content listings.
//!
//! [`build_query`] turns request parameters into a [`QueryDescriptor`]; the
//! backends evaluate it in memory, as PostgreSQL, or as a document filter.

pub mod builder;
pub mod document;
pub mod in_memory;
pub mod sql;
pub mod types;

pub use builder::build_query;
pub use document::{to_document_filter, to_document_sort};
pub use in_memory::apply_to_in_memory_set;
pub use sql::SqlQueryBuilder;
pub use types::{
    CreatedRange, FieldFilter, FilterKind, QueryDescriptor, SearchSpec, SearchTarget, SortKey,
    SortOrder, SortRequest, SortSpec,
};
