//! Process-wide schema registry
//!
//! Schemas are keyed by the entity's `TypeId`, built on first request and never
//! mutated afterwards. Building happens outside the lock; if two coroutines race
//! to boot the same entity, the first insert wins and both get the same `Arc`.

use crate::error::LifeError;
use crate::schema::entity::{EntitySchema, SchemaBuilder};
use crate::schema::LifeEntity;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

static SCHEMA_REGISTRY: Lazy<RwLock<HashMap<TypeId, Arc<EntitySchema>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Schema of `E`, booting it on first use.
///
/// # Errors
///
/// Propagates errors from `E::describe` and from building the schema
/// (duplicate columns, missing primary column). Returns
/// [`LifeError::Registry`] if the registry lock is poisoned.
pub fn schema_of<E: LifeEntity>() -> Result<Arc<EntitySchema>, LifeError> {
    let id = TypeId::of::<E>();
    {
        let registry = SCHEMA_REGISTRY
            .read()
            .map_err(|e| LifeError::Registry(format!("Failed to read schema registry: {e}")))?;
        if let Some(schema) = registry.get(&id) {
            return Ok(Arc::clone(schema));
        }
    }

    let schema = Arc::new(boot::<E>()?);
    log::debug!(
        "booted entity {} (table {}, connection {}, {} columns, {} relations)",
        schema.name(),
        schema.table(),
        schema.connection(),
        schema.columns().len(),
        schema.relations().len()
    );

    let mut registry = SCHEMA_REGISTRY
        .write()
        .map_err(|e| LifeError::Registry(format!("Failed to lock schema registry: {e}")))?;
    Ok(Arc::clone(registry.entry(id).or_insert(schema)))
}

/// Build a fresh schema for `E` without touching the registry.
pub fn boot<E: LifeEntity>() -> Result<EntitySchema, LifeError> {
    let mut builder = SchemaBuilder::new(E::NAME);
    E::describe(&mut builder)?;
    builder.build()
}

/// Whether `E` has already been booted.
pub fn is_booted<E: LifeEntity>() -> Result<bool, LifeError> {
    let registry = SCHEMA_REGISTRY
        .read()
        .map_err(|e| LifeError::Registry(format!("Failed to read schema registry: {e}")))?;
    Ok(registry.contains_key(&TypeId::of::<E>()))
}
