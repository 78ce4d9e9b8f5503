//! Error type shared by every layer of the crate.
//!
//! Storage implementations, the query builder, the eager-load resolver and the
//! factory all report failures through [`LifeError`]. Storage failures are
//! passed through unchanged so callers can match on what the driver said.

use thiserror::Error;

/// Errors produced while describing entities, composing queries, resolving
/// relations or talking to a storage connection.
#[derive(Debug, Error)]
pub enum LifeError {
    /// A storage row carried a key that no column of the entity maps.
    #[error("the field {column} has not been mapped by any column of the {entity} entity")]
    UnmappedColumn { column: String, entity: String },

    /// An include path named a relation the entity does not declare.
    #[error("relation {relation} not found in entity {entity}")]
    RelationNotFound { relation: String, entity: String },

    /// Two columns of one entity claimed the same storage name or property.
    #[error("column {column} of entity {entity} is already mapped to property {existing}, cannot map it to {property}")]
    DuplicateColumn {
        column: String,
        property: String,
        existing: String,
        entity: String,
    },

    /// The entity declares no column for its primary-key property.
    #[error("entity {entity} has no column for its primary key {property}")]
    MissingPrimaryKey { property: String, entity: String },

    /// The entity was asked for factory data but has no definition.
    #[error("the definition method has not been implemented for {0}; implement LifeEntity::definition to use its factory")]
    DefinitionNotImplemented(String),

    /// No storage connection is registered under the requested name.
    #[error("connection {0} is not registered")]
    ConnectionNotFound(String),

    /// Raised by a storage implementation.
    #[error("storage error: {0}")]
    Storage(String),

    /// A query handle could not be lowered into a statement.
    #[error("statement error: {0}")]
    Statement(String),

    /// A materialized instance could not be converted into the requested type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A spawned coroutine panicked before producing its result.
    #[error("coroutine failed: {0}")]
    Coroutine(String),

    /// A factory assertion did not hold.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// The schema registry could not be accessed.
    #[error("schema registry error: {0}")]
    Registry(String),
}

impl LifeError {
    /// Shorthand for storage implementations reporting a driver failure.
    pub fn storage(message: impl Into<String>) -> Self {
        LifeError::Storage(message.into())
    }

    /// Returns `true` when the error came from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, LifeError::Storage(_))
    }
}
