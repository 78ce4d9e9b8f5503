//! Named storage connections shared by every query.
//!
//! A [`Database`] is a cheap-to-clone handle holding the ORM configuration and
//! the storage registered under each connection name. Entities pick their
//! connection by name; the name `"default"` is an alias for
//! [`OrmConfig::default_connection`].
//!
//! # Example
//!
//! ```
//! use lifeline::{Database, OrmConfig};
//! use lifeline::storage::MemoryStorage;
//! use std::sync::Arc;
//!
//! let primary = Arc::new(MemoryStorage::new());
//! let db = Database::builder()
//!     .config(OrmConfig::default().with_default_connection("primary"))
//!     .connection("primary", primary)
//!     .build();
//!
//! assert!(db.connection("default").is_ok());
//! assert!(db.connection("replica").is_err());
//! ```

use crate::config::OrmConfig;
use crate::error::LifeError;
use crate::schema::DEFAULT_CONNECTION;
use crate::storage::Storage;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    config: OrmConfig,
    connections: HashMap<String, Arc<dyn Storage>>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// A database with default configuration and one storage serving every
    /// entity on the default connection.
    pub fn single<S: Storage + 'static>(storage: Arc<S>) -> Self {
        Self::builder()
            .connection(DEFAULT_CONNECTION, storage)
            .build()
    }

    /// Storage registered under `name`, resolving the `"default"` alias.
    pub fn connection(&self, name: &str) -> Result<Arc<dyn Storage>, LifeError> {
        let connections = &self.inner.connections;
        let resolved = if name == DEFAULT_CONNECTION {
            self.inner.config.default_connection.as_str()
        } else {
            name
        };
        connections
            .get(resolved)
            .or_else(|| connections.get(name))
            .cloned()
            .ok_or_else(|| LifeError::ConnectionNotFound(resolved.to_string()))
    }

    pub fn config(&self) -> &OrmConfig {
        &self.inner.config
    }

    /// Registered connection names, sorted.
    pub fn connection_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.inner.config)
            .field("connections", &self.connection_names())
            .finish()
    }
}

#[derive(Default)]
pub struct DatabaseBuilder {
    config: Option<OrmConfig>,
    connections: HashMap<String, Arc<dyn Storage>>,
}

impl DatabaseBuilder {
    pub fn config(mut self, config: OrmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register `storage` under `name`. A later registration replaces an earlier one.
    pub fn connection<S: Storage + 'static>(mut self, name: impl Into<String>, storage: Arc<S>) -> Self {
        self.connections.insert(name.into(), storage);
        self
    }

    pub fn build(self) -> Database {
        let config = self.config.unwrap_or_default();
        log::debug!(
            "database ready: default connection {}, {} connection(s)",
            config.default_connection,
            self.connections.len()
        );
        Database {
            inner: Arc::new(DatabaseInner {
                config,
                connections: self.connections,
            }),
        }
    }
}
