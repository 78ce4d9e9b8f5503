//! Integration tests for lifeline over the in-memory storage.
//!
//! Each module exercises one public surface end to end: schema boot, query
//! composition, eager loading, writes, pagination and factories.


mod eager_loading;
mod factory;
mod persistence;
mod schema;
