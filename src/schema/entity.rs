//! Entity schemas and the builder entities describe themselves with.

use crate::error::LifeError;
use crate::relation::def::{HostInfo, Relation, RelationDef};
use crate::schema::column::ColumnDef;
use crate::schema::naming;
use std::collections::HashMap;

pub const DEFAULT_PRIMARY_KEY: &str = "id";
pub const DEFAULT_CONNECTION: &str = "default";

/// Collects the columns and relations of one entity.
///
/// Table, connection and primary key fall back to conventions when left unset:
/// the snake-cased plural of the entity name, the `"default"` connection and
/// `"id"`.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: &'static str,
    table: Option<String>,
    connection: Option<String>,
    primary_key: Option<String>,
    persist_only: Option<Vec<String>>,
    columns: Vec<ColumnDef>,
    relations: Vec<Relation>,
}

impl SchemaBuilder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            table: None,
            connection: None,
            primary_key: None,
            persist_only: None,
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    pub fn connection(&mut self, connection: impl Into<String>) -> &mut Self {
        self.connection = Some(connection.into());
        self
    }

    /// Property acting as primary key.
    pub fn primary_key(&mut self, property: impl Into<String>) -> &mut Self {
        self.primary_key = Some(property.into());
        self
    }

    /// Only these properties are written by `create` and `update`.
    pub fn persist_only<I, S>(&mut self, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persist_only = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Register a column.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::DuplicateColumn`] when the storage name or the
    /// property is already used by another column.
    pub fn column(&mut self, column: ColumnDef) -> Result<&mut Self, LifeError> {
        let clash = self
            .columns
            .iter()
            .find(|c| c.column == column.column || c.property == column.property);
        if let Some(existing) = clash {
            return Err(LifeError::DuplicateColumn {
                column: column.column,
                property: column.property,
                existing: existing.property.clone(),
                entity: self.name.to_string(),
            });
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Register a relation. Keys are inferred when the schema is built.
    pub fn relation(&mut self, relation: Relation) -> &mut Self {
        self.relations.push(relation);
        self
    }

    /// Apply boot defaults, derive the primary column and generate relation keys.
    pub fn build(self) -> Result<EntitySchema, LifeError> {
        let table = self.table.unwrap_or_else(|| naming::table_name(self.name));
        let connection = self
            .connection
            .unwrap_or_else(|| DEFAULT_CONNECTION.to_string());
        let primary_key = self
            .primary_key
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());

        let mut columns = self.columns;
        for column in &mut columns {
            column.is_primary = column.property == primary_key;
        }
        if !columns.iter().any(|c| c.is_primary) {
            return Err(LifeError::MissingPrimaryKey {
                property: primary_key,
                entity: self.name.to_string(),
            });
        }

        let column_dictionary = columns
            .iter()
            .map(|c| (c.column.clone(), c.property.clone()))
            .collect();
        let reverse_dictionary = columns
            .iter()
            .map(|c| (c.property.clone(), c.column.clone()))
            .collect();

        let host = HostInfo {
            name: self.name,
            table: &table,
            primary_key: &primary_key,
        };
        let relations = self
            .relations
            .into_iter()
            .map(|r| RelationDef::generate(host, r))
            .collect();

        Ok(EntitySchema {
            name: self.name,
            table,
            connection,
            primary_key,
            persist_only: self.persist_only,
            columns,
            relations,
            column_dictionary,
            reverse_dictionary,
        })
    }
}

/// Immutable description of an entity: where it lives and how its
/// properties map to storage columns.
#[derive(Debug)]
pub struct EntitySchema {
    name: &'static str,
    table: String,
    connection: String,
    primary_key: String,
    persist_only: Option<Vec<String>>,
    columns: Vec<ColumnDef>,
    relations: Vec<RelationDef>,
    column_dictionary: HashMap<String, String>,
    reverse_dictionary: HashMap<String, String>,
}

impl EntitySchema {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Primary-key property.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn primary_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.is_primary)
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, property: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// Relations in declaration order.
    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    pub fn relation(&self, property: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.property == property)
    }

    /// Storage column -> property.
    pub fn column_dictionary(&self) -> &HashMap<String, String> {
        &self.column_dictionary
    }

    /// Property -> storage column.
    pub fn reverse_column_dictionary(&self) -> &HashMap<String, String> {
        &self.reverse_dictionary
    }

    /// Storage column for `property`; unmapped names pass through unchanged.
    pub fn storage_column<'a>(&'a self, property: &'a str) -> &'a str {
        self.reverse_dictionary
            .get(property)
            .map(String::as_str)
            .unwrap_or(property)
    }

    pub fn property_of(&self, column: &str) -> Option<&str> {
        self.column_dictionary.get(column).map(String::as_str)
    }

    /// Whether `create`/`update` may write `property`.
    ///
    /// Only declared columns are ever written; without a persist-only list
    /// that is every column.
    pub fn persists(&self, property: &str) -> bool {
        if self.column(property).is_none() {
            return false;
        }
        match &self.persist_only {
            Some(allowed) => allowed.iter().any(|p| p == property),
            None => true,
        }
    }

    pub fn created_at_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.is_created_at)
    }

    pub fn updated_at_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.is_updated_at)
    }

    pub fn deleted_at_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.is_deleted_at)
    }
}
