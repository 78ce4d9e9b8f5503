//! Test-data factories.
//!
//! An entity opts in by implementing [`LifeEntity::definition`], returning a
//! [`Definition`] of property values. Values may reference another entity's
//! factory: that entity is fabricated first and one of its properties (the
//! primary key by default) fills the slot.
//!
//! # Example
//!
//! ```no_run
//! use lifeline::factory::fake::{faker::name::en::Name, Fake};
//! use lifeline::factory::Definition;
//! use lifeline::schema::{ColumnDef, SchemaBuilder};
//! use lifeline::storage::Row;
//! use lifeline::{Database, LifeEntity, LifeError};
//!
//! struct User;
//! impl LifeEntity for User {
//!     const NAME: &'static str = "User";
//!     fn describe(s: &mut SchemaBuilder) -> Result<(), LifeError> {
//!         s.column(ColumnDef::new("id"))?.column(ColumnDef::new("name"))?;
//!         Ok(())
//!     }
//!     fn definition() -> Result<Definition, LifeError> {
//!         Ok(Definition::new().value("name", Name().fake::<String>()))
//!     }
//! }
//!
//! # fn main() -> Result<(), LifeError> {
//! # let db: Database = todo!();
//! let users = User::factory(&db).count(10).create(Row::new())?;
//! assert_eq!(users.len(), 10);
//! User::factory(&db).assert_count(10)?;
//! # Ok(())
//! # }
//! ```

pub use fake;

use crate::coroutine::{self, Job};
use crate::database::Database;
use crate::error::LifeError;
use crate::model::Model;
use crate::query::QueryBuilder;
use crate::schema::LifeEntity;
use crate::storage::Row;
use serde_json::Value;
use std::marker::PhantomData;

/// Reference to another entity's factory inside a [`Definition`].
#[derive(Clone)]
pub struct NestedFactory {
    entity: &'static str,
    returning: Option<String>,
    resolve: fn(&Database, Option<&str>, bool) -> Result<Value, LifeError>,
}

impl NestedFactory {
    pub fn of<R: LifeEntity>() -> Self {
        Self {
            entity: R::NAME,
            returning: None,
            resolve: resolve_nested::<R>,
        }
    }

    /// Take `property` from the fabricated instance instead of its primary key.
    pub fn returning(mut self, property: impl Into<String>) -> Self {
        self.returning = Some(property.into());
        self
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    fn run(&self, db: &Database, persist: bool) -> Result<Value, LifeError> {
        (self.resolve)(db, self.returning.as_deref(), persist)
    }
}

impl std::fmt::Debug for NestedFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedFactory")
            .field("entity", &self.entity)
            .field("returning", &self.returning)
            .finish()
    }
}

fn resolve_nested<R: LifeEntity>(db: &Database, returning: Option<&str>, persist: bool) -> Result<Value, LifeError> {
    let schema = R::schema()?;
    let key = returning.unwrap_or_else(|| schema.primary_key());
    if persist {
        Ok(Factory::<R>::create_one(db, Row::new())?.value(key))
    } else {
        let row = Factory::<R>::make_one(db, Row::new())?;
        Ok(row.get(key).cloned().unwrap_or(Value::Null))
    }
}

#[derive(Debug, Clone)]
pub enum FactoryValue {
    Value(Value),
    Nested(NestedFactory),
}

/// Blueprint of one fabricated instance, keyed by property.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    entries: Vec<(String, FactoryValue)>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .push((property.into(), FactoryValue::Value(value.into())));
        self
    }

    /// Fill `property` with the primary key of a freshly fabricated `R`.
    pub fn nested<R: LifeEntity>(self, property: impl Into<String>) -> Self {
        self.nested_factory(property, NestedFactory::of::<R>())
    }

    pub fn nested_factory(mut self, property: impl Into<String>, factory: NestedFactory) -> Self {
        self.entries
            .push((property.into(), FactoryValue::Nested(factory)));
        self
    }

    pub fn entries(&self) -> &[(String, FactoryValue)] {
        &self.entries
    }
}

/// Result of a factory run: one instance, or `count(n)` of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Fabricated<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Fabricated<T> {
    pub fn len(&self) -> usize {
        match self {
            Fabricated::One(_) => 1,
            Fabricated::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Fabricated::One(item) => vec![item],
            Fabricated::Many(items) => items,
        }
    }

    /// The single instance, if this is `One`.
    pub fn into_one(self) -> Option<T> {
        match self {
            Fabricated::One(item) => Some(item),
            Fabricated::Many(_) => None,
        }
    }
}

/// Fabricates `E` instances from `E::definition()`.
pub struct Factory<E: LifeEntity> {
    db: Database,
    count: Option<usize>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: LifeEntity> Factory<E> {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            count: None,
            _entity: PhantomData,
        }
    }

    /// Produce `count` instances per call instead of one.
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Build property maps without touching storage. Nested references are
    /// made (not created) too.
    pub fn make(&self, overrides: Row) -> Result<Fabricated<Row>, LifeError> {
        self.run(overrides, Self::make_one)
    }

    /// Build and persist instances through [`QueryBuilder::create`].
    pub fn create(&self, overrides: Row) -> Result<Fabricated<Model>, LifeError> {
        self.run(overrides, Self::create_one)
    }

    fn run<T: Send + 'static>(
        &self,
        overrides: Row,
        one: fn(&Database, Row) -> Result<T, LifeError>,
    ) -> Result<Fabricated<T>, LifeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("factory", entity = E::NAME, count = ?self.count).entered();

        let Some(count) = self.count else {
            return Ok(Fabricated::One(one(&self.db, overrides)?));
        };

        log::debug!("fabricating {count} {}", E::NAME);
        let jobs: Vec<Job<T>> = (0..count)
            .map(|_| {
                let db = self.db.clone();
                let overrides = overrides.clone();
                Box::new(move || one(&db, overrides)) as Job<T>
            })
            .collect();
        Ok(Fabricated::Many(coroutine::join_all(jobs, self.db.config())?))
    }

    fn make_one(db: &Database, overrides: Row) -> Result<Row, LifeError> {
        let mut row = Self::build(db, overrides, false)?;
        let schema = E::schema()?;
        for column in schema.columns() {
            if column.is_primary || row.contains_key(&column.property) {
                continue;
            }
            if let Some(default) = &column.default_value {
                row.insert(column.property.clone(), default.clone());
            }
        }
        Ok(row)
    }

    fn create_one(db: &Database, overrides: Row) -> Result<Model, LifeError> {
        let values = Self::build(db, overrides, true)?;
        QueryBuilder::for_entity::<E>(db)?.create(values)
    }

    /// Definition values, then resolved nested references, then overrides.
    fn build(db: &Database, overrides: Row, persist: bool) -> Result<Row, LifeError> {
        let definition = E::definition()?;

        let mut row = Row::new();
        let mut nested: Vec<(String, NestedFactory)> = Vec::new();
        for (property, value) in definition.entries {
            if overrides.contains_key(&property) {
                continue;
            }
            match value {
                FactoryValue::Value(value) => {
                    row.insert(property, value);
                }
                FactoryValue::Nested(factory) => nested.push((property, factory)),
            }
        }

        let jobs: Vec<Job<Value>> = nested
            .iter()
            .map(|(_, factory)| {
                let factory = factory.clone();
                let db = db.clone();
                Box::new(move || factory.run(&db, persist)) as Job<Value>
            })
            .collect();
        let resolved = coroutine::join_all(jobs, db.config())?;
        for ((property, _), value) in nested.into_iter().zip(resolved) {
            row.insert(property, value);
        }

        row.extend(overrides);
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------

    /// Exactly `expected` rows of `E` exist.
    pub fn assert_count(&self, expected: u64) -> Result<(), LifeError> {
        let actual = E::query(&self.db)?.count()?;
        if actual != expected {
            return Err(LifeError::AssertionFailed(format!(
                "expected {expected} {} rows, found {actual}",
                E::NAME
            )));
        }
        Ok(())
    }

    /// Exactly `expected` rows of `E` match `filter`.
    pub fn assert_has(&self, filter: Row, expected: u64) -> Result<(), LifeError> {
        let actual = self.count_matching(&filter)?;
        if actual != expected {
            return Err(LifeError::AssertionFailed(format!(
                "expected {expected} {} rows matching {}, found {actual}",
                E::NAME,
                Value::Object(filter)
            )));
        }
        Ok(())
    }

    /// At least one row of `E` matches `filter`.
    pub fn assert_exists(&self, filter: Row) -> Result<(), LifeError> {
        if self.count_matching(&filter)? == 0 {
            return Err(LifeError::AssertionFailed(format!(
                "no {} row matches {}",
                E::NAME,
                Value::Object(filter)
            )));
        }
        Ok(())
    }

    /// No row of `E` matches `filter`.
    pub fn assert_missing(&self, filter: Row) -> Result<(), LifeError> {
        let actual = self.count_matching(&filter)?;
        if actual != 0 {
            return Err(LifeError::AssertionFailed(format!(
                "expected no {} row matching {}, found {actual}",
                E::NAME,
                Value::Object(filter)
            )));
        }
        Ok(())
    }

    fn count_matching(&self, filter: &Row) -> Result<u64, LifeError> {
        E::query(&self.db)?.where_all(filter.clone()).count()
    }
}
