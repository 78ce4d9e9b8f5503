//! Materialized entity instances.
//!
//! A [`Model`] holds the attributes of one row, keyed by property name, plus
//! whatever relations were eagerly loaded for it. [`materialize`] turns a raw
//! storage row into a `Model`, rejecting columns the entity does not map.

use crate::error::LifeError;
use crate::schema::EntitySchema;
use crate::storage::Row;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// A loaded relation value.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    One(Option<Box<Model>>),
    Many(Vec<Model>),
}

impl Loaded {
    pub fn to_json(&self) -> Value {
        match self {
            Loaded::One(Some(model)) => model.to_json(),
            Loaded::One(None) => Value::Null,
            Loaded::Many(models) => Value::Array(models.iter().map(Model::to_json).collect()),
        }
    }
}

/// One entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    entity: &'static str,
    attributes: Row,
    relations: BTreeMap<String, Loaded>,
    extras: BTreeMap<String, Vec<Row>>,
}

impl Model {
    pub fn new(entity: &'static str, attributes: Row) -> Self {
        Self {
            entity,
            attributes,
            relations: BTreeMap::new(),
            extras: BTreeMap::new(),
        }
    }

    /// Name of the entity this instance belongs to.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.attributes.get(property)
    }

    /// Attribute value, `Null` when absent.
    pub fn value(&self, property: &str) -> Value {
        self.attributes.get(property).cloned().unwrap_or(Value::Null)
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    pub fn relation(&self, property: &str) -> Option<&Loaded> {
        self.relations.get(property)
    }

    /// Single related instance of a loaded `HasOne`/`BelongsTo` relation.
    pub fn one(&self, property: &str) -> Option<&Model> {
        match self.relations.get(property) {
            Some(Loaded::One(Some(model))) => Some(model),
            _ => None,
        }
    }

    /// Related instances of a loaded `HasMany`/`ManyToMany` relation; empty
    /// when the relation was not loaded.
    pub fn many(&self, property: &str) -> &[Model] {
        match self.relations.get(property) {
            Some(Loaded::Many(models)) => models,
            _ => &[],
        }
    }

    pub fn is_loaded(&self, property: &str) -> bool {
        self.relations.contains_key(property)
    }

    /// Pivot rows fetched while loading a many-to-many relation.
    pub fn extras(&self, relation: &str) -> Option<&[Row]> {
        self.extras.get(relation).map(Vec::as_slice)
    }

    pub(crate) fn set_relation(&mut self, property: impl Into<String>, loaded: Loaded) {
        self.relations.insert(property.into(), loaded);
    }

    pub(crate) fn set_extras(&mut self, relation: impl Into<String>, rows: Vec<Row>) {
        self.extras.insert(relation.into(), rows);
    }

    /// Attributes and loaded relations as one JSON object. Pivot rows land
    /// under `"$extras"` keyed by relation.
    pub fn to_json(&self) -> Value {
        let mut object = self.attributes.clone();
        for (property, loaded) in &self.relations {
            object.insert(property.clone(), loaded.to_json());
        }
        if !self.extras.is_empty() {
            let extras = self
                .extras
                .iter()
                .map(|(k, rows)| {
                    let rows = rows.iter().cloned().map(Value::Object).collect();
                    (k.clone(), Value::Array(rows))
                })
                .collect();
            object.insert("$extras".to_string(), Value::Object(extras));
        }
        Value::Object(object)
    }

    /// Deserialize into a plain struct.
    pub fn into_typed<T: DeserializeOwned>(&self) -> Result<T, LifeError> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

/// Build an instance from a storage row.
///
/// # Errors
///
/// [`LifeError::UnmappedColumn`] if the row carries a key that is not a
/// storage column of `schema`.
pub fn materialize(schema: &EntitySchema, row: Row) -> Result<Model, LifeError> {
    let mut attributes = Row::new();
    for (column, value) in row {
        let Some(property) = schema.property_of(&column) else {
            return Err(LifeError::UnmappedColumn {
                column,
                entity: schema.name().to_string(),
            });
        };
        attributes.insert(property.to_string(), value);
    }
    Ok(Model::new(schema.name(), attributes))
}

pub fn materialize_many(schema: &EntitySchema, rows: Vec<Row>) -> Result<Vec<Model>, LifeError> {
    rows.into_iter().map(|row| materialize(schema, row)).collect()
}
