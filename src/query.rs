//! Query building and execution.
//!
//! - **Builder**: [`QueryBuilder`] composition (predicates, shape, window, includes)
//! - **Execution**: materializing operations (`get`, `get_many`, `paginate`, writes)
//! - **Table**: [`TableQuery`], the storage-level handle the builder drives
//! - **Pagination**: the [`Paginated`] response envelope

pub mod builder;
pub mod execution;
pub mod pagination;
pub mod table;

pub use builder::QueryBuilder;
pub use execution::timestamp;
pub use pagination::{Paginated, PaginationLinks, PaginationMeta};
pub use table::{Clause, Connective, Direction, Having, Operator, Predicate, TableQuery};
