//! # Lifeline
//!
//! Coroutine-native ORM core for the `may` runtime.
//!
//! Entities describe their columns and relations once; the resulting schema is
//! cached per type and drives a fluent [`QueryBuilder`] that translates
//! property names to storage columns, materializes rows into [`Model`]s and
//! eager-loads nested relations concurrently. A [`Factory`] fabricates test
//! data from an entity's [`Definition`].
//!
//! Storage is pluggable through the [`Storage`](storage::Storage) trait.
//! [`MemoryStorage`](storage::MemoryStorage) ships in-crate; SQL backends lower
//! queries with the [`sql`] module.

pub mod config;
mod coroutine;
pub mod database;
pub mod error;
pub mod factory;
pub mod model;
pub mod query;
pub mod relation;
pub mod schema;
pub mod sql;
pub mod storage;

#[cfg(test)]
mod tests_cfg;

pub use config::OrmConfig;
pub use database::{Database, DatabaseBuilder};
pub use error::LifeError;
pub use factory::{Definition, Fabricated, Factory};
pub use model::{Loaded, Model};
pub use query::{Direction, Operator, Paginated, QueryBuilder};
pub use relation::Relation;
pub use schema::{ColumnDef, EntitySchema, LifeEntity, SchemaBuilder};
pub use storage::{MemoryStorage, Row, Storage};
