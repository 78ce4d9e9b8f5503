//! The storage contract consumed by the query builder.
//!
//! A [`Storage`] executes a [`TableQuery`] and hands back raw rows keyed by
//! storage column name. It knows nothing about entities, properties or
//! relations; the query builder translates names before calling it and the
//! materializer translates rows after.
//!
//! Implementations are synchronous. Under the `may` runtime a blocking call on
//! a coroutine-aware driver parks the coroutine, which is how the eager-load
//! resolver overlaps the lookups of several relations.
//!
//! # Example
//!
//! ```no_run
//! use lifeline::storage::{MemoryStorage, Row, Storage};
//! use lifeline::query::TableQuery;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), lifeline::LifeError> {
//! let storage = MemoryStorage::new();
//! let mut values = Row::new();
//! values.insert("name".into(), json!("Ada"));
//! let ids = storage.insert("users", values, "id")?;
//!
//! let mut query = TableQuery::table("users");
//! query.build_where("id", lifeline::query::Operator::Eq, ids[0].clone());
//! assert!(storage.find(&query)?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod filter;
pub mod memory;

pub use memory::{CallRecord, MemoryStorage, StorageOperation};

use crate::error::LifeError;
use crate::query::pagination::Paginated;
use crate::query::table::TableQuery;
use serde_json::Value;

/// A raw storage row: storage column name to value.
pub type Row = serde_json::Map<String, Value>;

/// Executes table queries against one connection.
pub trait Storage: Send + Sync {
    /// First row matching the query, if any.
    fn find(&self, query: &TableQuery) -> Result<Option<Row>, LifeError>;

    /// Every row matching the query, honoring projection, ordering and window.
    fn find_many(&self, query: &TableQuery) -> Result<Vec<Row>, LifeError>;

    /// Number of rows the query would return.
    fn count(&self, query: &TableQuery) -> Result<u64, LifeError> {
        Ok(self.find_many(query)?.len() as u64)
    }

    /// Rows of zero-based `page` when the result is cut in pages of `limit` rows.
    fn for_page(&self, query: &TableQuery, page: u64, limit: u64) -> Result<Vec<Row>, LifeError> {
        let mut windowed = query.without_window();
        windowed.build_skip(page.saturating_mul(limit)).build_limit(limit);
        self.find_many(&windowed)
    }

    /// One page of rows plus pagination metadata and links rooted at `resource_url`.
    fn paginate(
        &self,
        query: &TableQuery,
        page: u64,
        limit: u64,
        resource_url: &str,
    ) -> Result<Paginated<Row>, LifeError> {
        let total = self.count(&query.without_window())?;
        let data = self.for_page(query, page, limit)?;
        Ok(Paginated::from_window(data, total, page, limit, resource_url))
    }

    /// Insert one row into `table`, returning the value of `returning_key`
    /// for the inserted row.
    fn insert(&self, table: &str, values: Row, returning_key: &str) -> Result<Vec<Value>, LifeError>;

    /// Apply `values` to every row matching the query, returning the
    /// `returning_key` value of each updated row.
    fn update(&self, query: &TableQuery, values: Row, returning_key: &str) -> Result<Vec<Value>, LifeError>;

    /// Delete every row matching the query, returning how many went away.
    fn delete(&self, query: &TableQuery) -> Result<u64, LifeError>;
}
