//! Relation descriptors and the default-key generator.
//!
//! A relation is declared on the host entity with [`Relation`] and turned into a
//! [`RelationDef`] when the host schema is built. Keys the caller does not supply
//! are filled in by convention:
//!
//! | Kind | Host key | Related key |
//! |---|---|---|
//! | `HasOne` / `HasMany` | host primary key | `lowerFirst(Host) + "Id"` on the related entity |
//! | `BelongsTo` | `property + "Id"` on the host | related primary key (resolved at traversal) |
//! | `ManyToMany` | host primary key | through pivot `host_related` (resolved at traversal) |
//!
//! Keys given explicitly always win over conventions.
//!
//! # Example
//!
//! ```
//! use lifeline::relation::{Relation, RelationKind};
//! # use lifeline::{LifeEntity, LifeError, schema::{SchemaBuilder, ColumnDef}};
//! # struct Post;
//! # impl LifeEntity for Post {
//! #     const NAME: &'static str = "Post";
//! #     fn describe(s: &mut SchemaBuilder) -> Result<(), LifeError> {
//! #         s.column(ColumnDef::new("id"))?;
//! #         Ok(())
//! #     }
//! # }
//!
//! let posts = Relation::has_many::<Post>("posts").foreign_key("authorId");
//! assert_eq!(posts.property(), "posts");
//! ```

use crate::error::LifeError;
use crate::schema::naming;
use crate::schema::{registry, EntitySchema, LifeEntity};
use std::fmt;
use std::sync::Arc;

/// The four relation shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    HasOne,
    HasMany,
    BelongsTo,
    ManyToMany,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationType::HasOne => "hasOne",
            RelationType::HasMany => "hasMany",
            RelationType::BelongsTo => "belongsTo",
            RelationType::ManyToMany => "manyToMany",
        };
        f.write_str(name)
    }
}

/// Handle to the entity on the other side of a relation.
///
/// Holds a boot function rather than a schema so entities can reference each
/// other regardless of which one boots first.
#[derive(Clone, Copy)]
pub struct RelatedEntity {
    name: &'static str,
    boot: fn() -> Result<Arc<EntitySchema>, LifeError>,
}

impl RelatedEntity {
    pub fn of<R: LifeEntity>() -> Self {
        Self {
            name: R::NAME,
            boot: registry::schema_of::<R>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Schema of the related entity, booting it on first use.
    pub fn schema(&self) -> Result<Arc<EntitySchema>, LifeError> {
        (self.boot)()
    }
}

impl fmt::Debug for RelatedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelatedEntity").field(&self.name).finish()
    }
}

impl PartialEq for RelatedEntity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Keys supplied by the caller when declaring a relation.
///
/// Which field means what depends on the relation type; see the setters on
/// [`Relation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationOptions {
    pub primary_key: Option<String>,
    pub foreign_key: Option<String>,
    pub pivot_table: Option<String>,
    pub pivot_local_foreign_key: Option<String>,
    pub pivot_related_foreign_key: Option<String>,
    pub related_primary_key: Option<String>,
}

/// A relation declaration, before defaults are applied.
#[derive(Debug, Clone)]
pub struct Relation {
    property: String,
    related: RelatedEntity,
    rel_type: RelationType,
    options: RelationOptions,
}

impl Relation {
    fn new<R: LifeEntity>(property: impl Into<String>, rel_type: RelationType) -> Self {
        Self {
            property: property.into(),
            related: RelatedEntity::of::<R>(),
            rel_type,
            options: RelationOptions::default(),
        }
    }

    /// The host owns at most one `R`, found by `R.<foreign_key> = host.<primary_key>`.
    pub fn has_one<R: LifeEntity>(property: impl Into<String>) -> Self {
        Self::new::<R>(property, RelationType::HasOne)
    }

    /// The host owns any number of `R`, found by `R.<foreign_key> = host.<primary_key>`.
    pub fn has_many<R: LifeEntity>(property: impl Into<String>) -> Self {
        Self::new::<R>(property, RelationType::HasMany)
    }

    /// The host points at one `R`, found by `R.<primary_key> = host.<foreign_key>`.
    ///
    /// The host's foreign key defaults to `property + "Id"` and `R`'s key to its
    /// primary key. This differs from the older convention that put
    /// `property + "Id"` on the related side and matched it against the host's
    /// primary key; only the host-side form is supported.
    pub fn belongs_to<R: LifeEntity>(property: impl Into<String>) -> Self {
        Self::new::<R>(property, RelationType::BelongsTo)
    }

    /// Host and `R` are linked through rows of a pivot table.
    pub fn many_to_many<R: LifeEntity>(property: impl Into<String>) -> Self {
        Self::new::<R>(property, RelationType::ManyToMany)
    }

    /// Host key for `HasOne`/`HasMany`/`ManyToMany`; related key for `BelongsTo`.
    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.options.primary_key = Some(key.into());
        self
    }

    /// Related key for `HasOne`/`HasMany`; host key for `BelongsTo`.
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.options.foreign_key = Some(key.into());
        self
    }

    pub fn pivot_table(mut self, table: impl Into<String>) -> Self {
        self.options.pivot_table = Some(table.into());
        self
    }

    /// Pivot column holding the host key.
    pub fn pivot_local_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.options.pivot_local_foreign_key = Some(column.into());
        self
    }

    /// Pivot column holding the related key.
    pub fn pivot_related_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.options.pivot_related_foreign_key = Some(column.into());
        self
    }

    /// Related key a `ManyToMany` pivot points at.
    pub fn related_primary_key(mut self, key: impl Into<String>) -> Self {
        self.options.related_primary_key = Some(key.into());
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn rel_type(&self) -> RelationType {
        self.rel_type
    }

    pub fn options(&self) -> &RelationOptions {
        &self.options
    }
}

/// What the generator needs to know about the host.
#[derive(Debug, Clone, Copy)]
pub struct HostInfo<'a> {
    pub name: &'a str,
    pub table: &'a str,
    pub primary_key: &'a str,
}

/// Pivot keys of a many-to-many relation.
///
/// `pivot_table`, `related_primary_key` and `pivot_related_foreign_key` depend on
/// the related schema and stay `None` until [`PivotKeys::resolve`] is called
/// with it, unless the caller supplied them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotKeys {
    pub host_primary_key: String,
    pub pivot_host_foreign_key: String,
    pub pivot_table: Option<String>,
    pub related_primary_key: Option<String>,
    pub pivot_related_foreign_key: Option<String>,
}

/// Fully-resolved pivot keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPivot {
    pub host_primary_key: String,
    pub pivot_host_foreign_key: String,
    pub pivot_table: String,
    pub related_primary_key: String,
    pub pivot_related_foreign_key: String,
}

impl PivotKeys {
    pub fn resolve(&self, host: &EntitySchema, related: &EntitySchema) -> ResolvedPivot {
        ResolvedPivot {
            host_primary_key: self.host_primary_key.clone(),
            pivot_host_foreign_key: self.pivot_host_foreign_key.clone(),
            pivot_table: self
                .pivot_table
                .clone()
                .unwrap_or_else(|| format!("{}_{}", host.table(), related.table())),
            related_primary_key: self
                .related_primary_key
                .clone()
                .unwrap_or_else(|| related.primary_key().to_string()),
            pivot_related_foreign_key: self
                .pivot_related_foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}Id", naming::singular(related.table()))),
        }
    }
}

/// Relation shape with its keys. Key names are entity properties, except the
/// pivot columns which are storage names in the pivot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    HasOne {
        host_primary_key: String,
        related_foreign_key: String,
    },
    HasMany {
        host_primary_key: String,
        related_foreign_key: String,
    },
    BelongsTo {
        host_foreign_key: String,
        related_primary_key: Option<String>,
    },
    ManyToMany(PivotKeys),
}

impl RelationKind {
    pub fn rel_type(&self) -> RelationType {
        match self {
            RelationKind::HasOne { .. } => RelationType::HasOne,
            RelationKind::HasMany { .. } => RelationType::HasMany,
            RelationKind::BelongsTo { .. } => RelationType::BelongsTo,
            RelationKind::ManyToMany(_) => RelationType::ManyToMany,
        }
    }

    /// Whether the relation materializes as a list.
    pub fn is_many(&self) -> bool {
        matches!(self, RelationKind::HasMany { .. } | RelationKind::ManyToMany(_))
    }
}

/// A relation of a built schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    pub property: String,
    pub related: RelatedEntity,
    pub kind: RelationKind,
}

impl RelationDef {
    /// Apply naming conventions to a declaration; explicit keys always win.
    pub fn generate(host: HostInfo<'_>, relation: Relation) -> Self {
        let Relation {
            property,
            related,
            rel_type,
            options,
        } = relation;

        let kind = match rel_type {
            RelationType::HasOne | RelationType::HasMany => {
                let host_primary_key = options
                    .primary_key
                    .unwrap_or_else(|| host.primary_key.to_string());
                let related_foreign_key = options
                    .foreign_key
                    .unwrap_or_else(|| naming::foreign_key_for(host.name));
                if rel_type == RelationType::HasOne {
                    RelationKind::HasOne {
                        host_primary_key,
                        related_foreign_key,
                    }
                } else {
                    RelationKind::HasMany {
                        host_primary_key,
                        related_foreign_key,
                    }
                }
            }
            RelationType::BelongsTo => RelationKind::BelongsTo {
                host_foreign_key: options
                    .foreign_key
                    .unwrap_or_else(|| format!("{property}Id")),
                related_primary_key: options.primary_key,
            },
            RelationType::ManyToMany => RelationKind::ManyToMany(PivotKeys {
                host_primary_key: options
                    .primary_key
                    .unwrap_or_else(|| host.primary_key.to_string()),
                pivot_host_foreign_key: options
                    .pivot_local_foreign_key
                    .unwrap_or_else(|| format!("{}Id", naming::singular(host.table))),
                pivot_table: options.pivot_table,
                related_primary_key: options.related_primary_key,
                pivot_related_foreign_key: options.pivot_related_foreign_key,
            }),
        };

        Self {
            property,
            related,
            kind,
        }
    }

    pub fn rel_type(&self) -> RelationType {
        self.kind.rel_type()
    }
}
