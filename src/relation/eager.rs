//! Eager loading of included relations.
//!
//! After the query builder materializes its instances, [`resolve`] walks the
//! relations named in the query's [`IncludeTree`] and attaches their values.
//!
//! # Strategy
//!
//! 1. Included relations are visited in the order the host entity declares them.
//! 2. Instances are processed one after another. For a single instance the
//!    lookups of its relations run concurrently on `may` coroutines (unless
//!    `fan_out` is disabled) and are all joined before anything is attached.
//! 3. Each lookup is an ordinary [`QueryBuilder`] on the related entity carrying
//!    the nested include tree, so deeper paths resolve recursively.
//! 4. Many-to-many lookups first read the pivot rows on the host's connection,
//!    keep them as the instance's extras, then fetch the related rows by key.
//!
//! This issues one lookup per instance per relation. Any failure aborts the
//! whole resolution and the caller gets the error, never a half-loaded instance.

use crate::coroutine::{self, Job};
use crate::database::Database;
use crate::error::LifeError;
use crate::model::{Loaded, Model};
use crate::query::table::{Operator, TableQuery};
use crate::query::QueryBuilder;
use crate::relation::def::{RelationDef, RelationKind};
use crate::relation::include::{IncludeNode, IncludeTree};
use crate::schema::EntitySchema;
use crate::storage::filter::values_equal;
use crate::storage::Row;
use serde_json::Value;
use std::sync::Arc;

struct Resolved {
    property: String,
    loaded: Loaded,
    pivot_rows: Option<Vec<Row>>,
}

/// Load every included relation of `models`.
pub(crate) fn resolve(
    db: &Database,
    schema: &Arc<EntitySchema>,
    models: &mut [Model],
    includes: &IncludeTree,
) -> Result<(), LifeError> {
    if includes.is_empty() || models.is_empty() {
        return Ok(());
    }

    let included: Vec<(RelationDef, IncludeNode)> = schema
        .relations()
        .iter()
        .filter_map(|r| includes.get(&r.property).map(|n| (r.clone(), n.clone())))
        .collect();

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "eager_load",
        entity = schema.name(),
        instances = models.len(),
        relations = included.len()
    )
    .entered();

    for model in models.iter_mut() {
        let jobs: Vec<Job<Resolved>> = included
            .iter()
            .map(|(relation, node)| {
                let db = db.clone();
                let host = Arc::clone(schema);
                let relation = relation.clone();
                let node = node.clone();
                let attributes = model.attributes().clone();
                Box::new(move || load(&db, &host, &relation, &node, &attributes)) as Job<Resolved>
            })
            .collect();

        for resolved in coroutine::join_all(jobs, db.config())? {
            if let Some(rows) = resolved.pivot_rows {
                model.set_extras(resolved.property.clone(), rows);
            }
            model.set_relation(resolved.property, resolved.loaded);
        }
    }
    Ok(())
}

fn apply_callback(node: &IncludeNode, builder: QueryBuilder) -> Result<QueryBuilder, LifeError> {
    match node.callback() {
        Some(callback) => callback(builder),
        None => Ok(builder),
    }
}

fn load(
    db: &Database,
    host: &EntitySchema,
    relation: &RelationDef,
    node: &IncludeNode,
    attributes: &Row,
) -> Result<Resolved, LifeError> {
    let related = relation.related.schema()?;
    let value_of = |property: &str| attributes.get(property).cloned().unwrap_or(Value::Null);
    let builder = QueryBuilder::new(db, Arc::clone(&related))?.with_includes(node.children().clone());

    log::debug!(
        "loading {}.{} ({})",
        host.name(),
        relation.property,
        relation.rel_type()
    );

    let (loaded, pivot_rows) = match &relation.kind {
        RelationKind::HasOne {
            host_primary_key,
            related_foreign_key,
        } => {
            let builder = builder.where_eq(related_foreign_key, value_of(host_primary_key));
            let found = apply_callback(node, builder)?.get()?;
            (Loaded::One(found.map(Box::new)), None)
        }
        RelationKind::HasMany {
            host_primary_key,
            related_foreign_key,
        } => {
            let builder = builder.where_eq(related_foreign_key, value_of(host_primary_key));
            (Loaded::Many(apply_callback(node, builder)?.get_many()?), None)
        }
        RelationKind::BelongsTo {
            host_foreign_key,
            related_primary_key,
        } => {
            let target = related_primary_key
                .as_deref()
                .unwrap_or_else(|| related.primary_key());
            let builder = builder.where_eq(target, value_of(host_foreign_key));
            let found = apply_callback(node, builder)?.get()?;
            (Loaded::One(found.map(Box::new)), None)
        }
        RelationKind::ManyToMany(keys) => {
            let pivot = keys.resolve(host, &related);
            let storage = db.connection(host.connection())?;

            let mut pivot_query = TableQuery::table(&pivot.pivot_table);
            pivot_query.build_where(
                &pivot.pivot_host_foreign_key,
                Operator::Eq,
                value_of(&pivot.host_primary_key),
            );
            log::debug!("{}: find_many on pivot {}", host.connection(), pivot.pivot_table);
            let pivot_rows = storage.find_many(&pivot_query)?;

            let ids: Vec<Value> = pivot_rows
                .iter()
                .filter_map(|row| row.get(&pivot.pivot_related_foreign_key))
                .filter(|id| !id.is_null())
                .cloned()
                .collect();

            let mut models = if ids.is_empty() {
                Vec::new()
            } else {
                let builder = builder.where_in(&pivot.related_primary_key, ids.clone());
                apply_callback(node, builder)?.get_many()?
            };

            if node.callback().is_none() {
                models.sort_by_key(|m| {
                    let key = m.value(&pivot.related_primary_key);
                    ids.iter()
                        .position(|id| values_equal(id, &key))
                        .unwrap_or(usize::MAX)
                });
            }
            (Loaded::Many(models), Some(pivot_rows))
        }
    };

    Ok(Resolved {
        property: relation.property.clone(),
        loaded,
        pivot_rows,
    })
}
