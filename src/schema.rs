//! Entity metadata registry.
//!
//! Every entity type implements [`LifeEntity`], describing its columns and
//! relations once through a [`SchemaBuilder`]. The resulting [`EntitySchema`]
//! is built lazily on first use, cached per type for the life of the process,
//! and shared read-only by every query.
//!
//! # Example
//!
//! ```
//! use lifeline::{LifeEntity, LifeError};
//! use lifeline::relation::Relation;
//! use lifeline::schema::{ColumnDef, SchemaBuilder};
//!
//! struct User;
//! struct Post;
//!
//! impl LifeEntity for User {
//!     const NAME: &'static str = "User";
//!
//!     fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
//!         schema
//!             .column(ColumnDef::new("id"))?
//!             .column(ColumnDef::new("name"))?
//!             .column(ColumnDef::new("createdAt").name("created_at").created_at())?
//!             .relation(Relation::has_many::<Post>("posts"));
//!         Ok(())
//!     }
//! }
//!
//! impl LifeEntity for Post {
//!     const NAME: &'static str = "Post";
//!
//!     fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
//!         schema
//!             .column(ColumnDef::new("id"))?
//!             .column(ColumnDef::new("userId").name("user_id"))?
//!             .relation(Relation::belongs_to::<User>("user"));
//!         Ok(())
//!     }
//! }
//!
//! let users = User::schema()?;
//! assert_eq!(users.table(), "users");
//! assert_eq!(users.storage_column("createdAt"), "created_at");
//! # Ok::<(), LifeError>(())
//! ```

pub mod column;
pub mod entity;
pub mod naming;
pub mod registry;

pub use column::ColumnDef;
pub use entity::{EntitySchema, SchemaBuilder, DEFAULT_CONNECTION, DEFAULT_PRIMARY_KEY};
pub use registry::schema_of;

use crate::database::Database;
use crate::error::LifeError;
use crate::factory::{Definition, Factory};
use crate::query::QueryBuilder;
use std::sync::Arc;

/// An entity type known to the ORM.
pub trait LifeEntity: Send + Sync + 'static {
    /// Entity name; drives the default table name and relation keys.
    const NAME: &'static str;

    /// Register columns, relations and overrides of the boot defaults.
    fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError>;

    /// Test-data blueprint used by [`Factory`].
    fn definition() -> Result<Definition, LifeError> {
        Err(LifeError::DefinitionNotImplemented(Self::NAME.to_string()))
    }

    /// Booted schema of this entity.
    fn schema() -> Result<Arc<EntitySchema>, LifeError>
    where
        Self: Sized,
    {
        registry::schema_of::<Self>()
    }

    /// Fresh query against this entity's table and connection.
    fn query(db: &Database) -> Result<QueryBuilder, LifeError>
    where
        Self: Sized,
    {
        QueryBuilder::new(db, Self::schema()?)
    }

    fn factory(db: &Database) -> Factory<Self>
    where
        Self: Sized,
    {
        Factory::new(db)
    }
}
