//! Materializing operations of [`QueryBuilder`].
//!
//! Every method here consumes the builder: once a query has run, the builder
//! is gone. Reads go storage -> materializer -> eager-load resolver; writes
//! translate property names to storage columns, stamp marker columns, then
//! read the affected row back through a fresh query that keeps the includes.

use crate::error::LifeError;
use crate::model::{materialize, materialize_many, Model};
use crate::query::builder::QueryBuilder;
use crate::query::pagination::Paginated;
use crate::relation::eager;
use crate::storage::Row;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Current instant in the format marker columns are stamped with.
pub fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn is_absent(values: &Row, column: &str) -> bool {
    values.get(column).map_or(true, Value::is_null)
}

impl QueryBuilder {
    /// First matching instance, with includes loaded.
    pub fn get(self) -> Result<Option<Model>, LifeError> {
        log::debug!("{}: find on {}", self.schema.connection(), self.query.table_name());
        let Some(row) = self.storage.find(&self.query)? else {
            return Ok(None);
        };
        let mut models = vec![materialize(&self.schema, row)?];
        eager::resolve(&self.db, &self.schema, &mut models, &self.includes)?;
        Ok(models.pop())
    }

    /// Every matching instance, with includes loaded.
    pub fn get_many(self) -> Result<Vec<Model>, LifeError> {
        log::debug!("{}: find_many on {}", self.schema.connection(), self.query.table_name());
        let rows = self.storage.find_many(&self.query)?;
        self.hydrate(rows)
    }

    /// Every matching instance together with how many there are.
    pub fn get_many_count(self) -> Result<(u64, Vec<Model>), LifeError> {
        let models = self.get_many()?;
        Ok((models.len() as u64, models))
    }

    pub fn count(self) -> Result<u64, LifeError> {
        log::debug!("{}: count on {}", self.schema.connection(), self.query.table_name());
        self.storage.count(&self.query)
    }

    /// Instances of zero-based `page`, `limit` per page.
    pub fn for_page(self, page: u64, limit: u64) -> Result<Vec<Model>, LifeError> {
        log::debug!(
            "{}: for_page({page}, {limit}) on {}",
            self.schema.connection(),
            self.query.table_name()
        );
        let rows = self.storage.for_page(&self.query, page, limit)?;
        self.hydrate(rows)
    }

    /// One page with links rooted at the configured `resource_url`.
    pub fn paginate(self, page: u64, limit: u64) -> Result<Paginated<Model>, LifeError> {
        let resource_url = self.db.config().resource_url.clone();
        self.paginate_at(page, limit, &resource_url)
    }

    /// One page with links rooted at `resource_url`.
    pub fn paginate_at(self, page: u64, limit: u64, resource_url: &str) -> Result<Paginated<Model>, LifeError> {
        log::debug!(
            "{}: paginate({page}, {limit}) on {}",
            self.schema.connection(),
            self.query.table_name()
        );
        let page = self.storage.paginate(&self.query, page, limit, resource_url)?;
        let mut page = page.try_map(|row| materialize(&self.schema, row))?;
        eager::resolve(&self.db, &self.schema, &mut page.data, &self.includes)?;
        Ok(page)
    }

    /// Insert an instance and read it back.
    ///
    /// Properties outside the entity's persist-only list are dropped.
    /// Created-at and updated-at columns not supplied get the same current
    /// timestamp; other non-primary columns not supplied get their declared
    /// default.
    pub fn create(self, values: Row) -> Result<Model, LifeError> {
        self.insert(values, false)
    }

    /// Like [`create`](Self::create) but writes every supplied property that
    /// is a declared column, persist-only list or not.
    pub fn create_ignoring_persist_only(self, values: Row) -> Result<Model, LifeError> {
        self.insert(values, true)
    }

    fn insert(self, values: Row, ignore_persist_only: bool) -> Result<Model, LifeError> {
        let mut insert = Row::new();
        for (property, value) in values {
            let writable = if ignore_persist_only {
                self.schema.column(&property).is_some()
            } else {
                self.schema.persists(&property)
            };
            if writable {
                insert.insert(self.schema.storage_column(&property).to_string(), value);
            }
        }

        let now = timestamp();
        for column in self.schema.columns() {
            if !is_absent(&insert, &column.column) {
                continue;
            }
            if column.is_created_at || column.is_updated_at {
                insert.insert(column.column.clone(), now.clone());
            } else if !column.is_primary {
                if let Some(default) = &column.default_value {
                    insert.insert(column.column.clone(), default.clone());
                }
            }
        }

        let primary = self.primary_storage_column()?;
        log::debug!("{}: insert into {}", self.schema.connection(), self.schema.table());
        let keys = self.storage.insert(self.schema.table(), insert, &primary)?;
        let key = keys.into_iter().next().unwrap_or(Value::Null);

        let table = self.schema.table().to_string();
        self.refetch(key.clone())?.ok_or_else(|| {
            LifeError::storage(format!("inserted row {key} could not be read back from {table}"))
        })
    }

    /// Update every matching row with `values` and read back the first one.
    ///
    /// Properties outside the persist-only list, or that are not columns at
    /// all, are dropped; updated-at
    /// columns not supplied are stamped with the current time.
    pub fn update(self, values: Row) -> Result<Option<Model>, LifeError> {
        let mut update = Row::new();
        for (property, value) in values {
            if self.schema.persists(&property) {
                update.insert(self.schema.storage_column(&property).to_string(), value);
            }
        }
        self.write(update)
    }

    /// Single-property form of [`update`](Self::update).
    pub fn update_column(self, property: &str, value: impl Into<Value>) -> Result<Option<Model>, LifeError> {
        let mut values = Row::new();
        values.insert(property.to_string(), value.into());
        self.update(values)
    }

    fn write(self, mut update: Row) -> Result<Option<Model>, LifeError> {
        let now = timestamp();
        for column in self.schema.updated_at_columns() {
            if is_absent(&update, &column.column) {
                update.insert(column.column.clone(), now.clone());
            }
        }

        let primary = self.primary_storage_column()?;
        log::debug!("{}: update on {}", self.schema.connection(), self.query.table_name());
        let keys = self.storage.update(&self.query, update, &primary)?;
        match keys.into_iter().next() {
            Some(key) if !key.is_null() => self.refetch(key),
            _ => Ok(None),
        }
    }

    /// Soft-delete when the entity has a deleted-at column, returning the
    /// updated instance; otherwise remove the matching rows and return `None`.
    pub fn delete(self) -> Result<Option<Model>, LifeError> {
        match self.schema.deleted_at_column() {
            Some(column) => {
                let mut update = Row::new();
                update.insert(column.column.clone(), timestamp());
                self.write(update)
            }
            None => {
                self.force_delete()?;
                Ok(None)
            }
        }
    }

    /// Remove matching rows even when the entity soft-deletes.
    pub fn force_delete(self) -> Result<u64, LifeError> {
        log::debug!("{}: delete on {}", self.schema.connection(), self.query.table_name());
        self.storage.delete(&self.query)
    }

    fn primary_storage_column(&self) -> Result<String, LifeError> {
        self.schema
            .primary_column()
            .map(|c| c.column.clone())
            .ok_or_else(|| LifeError::MissingPrimaryKey {
                property: self.schema.primary_key().to_string(),
                entity: self.schema.name().to_string(),
            })
    }

    /// Fresh lookup by primary key on the same entity, keeping includes.
    fn refetch(self, key: Value) -> Result<Option<Model>, LifeError> {
        let primary_key = self.schema.primary_key().to_string();
        QueryBuilder::new(&self.db, Arc::clone(&self.schema))?
            .with_includes(self.includes)
            .where_eq(&primary_key, key)
            .get()
    }

    fn hydrate(self, rows: Vec<Row>) -> Result<Vec<Model>, LifeError> {
        let mut models = materialize_many(&self.schema, rows)?;
        eager::resolve(&self.db, &self.schema, &mut models, &self.includes)?;
        Ok(models)
    }
}
