//! Entity relationships
//!
//! - `has_one`: the related entity holds a foreign key to the host
//! - `has_many`: same, with any number of related rows
//! - `belongs_to`: the host holds a foreign key to the related entity
//! - `many_to_many`: host and related rows are linked through a pivot table
//!
//! Relations are declared in [`LifeEntity::describe`](crate::LifeEntity::describe)
//! and loaded on demand with [`QueryBuilder::includes`](crate::QueryBuilder::includes).

pub mod def;
pub(crate) mod eager;
pub mod include;

pub use def::{
    HostInfo, PivotKeys, RelatedEntity, Relation, RelationDef, RelationKind, RelationOptions,
    RelationType, ResolvedPivot,
};
pub use include::{IncludeCallback, IncludeNode, IncludeTree};
