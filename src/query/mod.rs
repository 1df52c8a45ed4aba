//! Book listing query building blocks: predicates, ordering, pagination and
//! CSV flattening. Nothing here touches storage.

pub mod csv;
pub mod filter;
pub mod pagination;
pub mod predicate;
pub mod sort;

pub use filter::FilterSpec;
pub use pagination::{total_pages, PageWindow, ResultPage};
pub use predicate::{BookField, FieldValue, Predicate};
pub use sort::{parse_sort, SortDirection, SortDirective};
