//! Query composition.
//!
//! A [`QueryBuilder`] targets one entity. Composition methods consume and
//! return the builder; every property name passes through the entity's
//! reverse column dictionary before reaching the [`TableQuery`], and names the
//! entity does not map are used as-is. Materializing methods live in the
//! execution module.

use crate::database::Database;
use crate::error::LifeError;
use crate::query::table::{Direction, Operator, TableQuery};
use crate::relation::include::{IncludeCallback, IncludeTree};
use crate::schema::{EntitySchema, LifeEntity};
use crate::storage::{Row, Storage};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Query against one entity.
///
/// # Example
///
/// ```no_run
/// use lifeline::{Database, LifeEntity, LifeError};
/// use lifeline::query::Direction;
/// # use lifeline::schema::{ColumnDef, SchemaBuilder};
/// # struct User;
/// # impl LifeEntity for User {
/// #     const NAME: &'static str = "User";
/// #     fn describe(s: &mut SchemaBuilder) -> Result<(), LifeError> {
/// #         s.column(ColumnDef::new("id"))?.column(ColumnDef::new("name"))?;
/// #         Ok(())
/// #     }
/// # }
/// # fn main() -> Result<(), LifeError> {
/// # let db: Database = todo!();
///
/// let admins = User::query(&db)?
///     .where_eq("role", "admin")
///     .where_not_null("verifiedAt")
///     .order_by("name", Direction::Asc)
///     .includes("posts.comments")?
///     .get_many()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    pub(crate) db: Database,
    pub(crate) schema: Arc<EntitySchema>,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) query: TableQuery,
    pub(crate) includes: IncludeTree,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("entity", &self.schema.name())
            .field("query", &self.query)
            .field("includes", &self.includes)
            .finish()
    }
}

impl QueryBuilder {
    /// Bind a query to the schema's connection and table.
    ///
    /// # Errors
    ///
    /// [`LifeError::ConnectionNotFound`] if the schema's connection is not
    /// registered on `db`.
    pub fn new(db: &Database, schema: Arc<EntitySchema>) -> Result<Self, LifeError> {
        let storage = db.connection(schema.connection())?;
        let query = TableQuery::table(schema.table());
        Ok(Self {
            db: db.clone(),
            schema,
            storage,
            query,
            includes: IncludeTree::default(),
        })
    }

    pub fn for_entity<E: LifeEntity>(db: &Database) -> Result<Self, LifeError> {
        Self::new(db, E::schema()?)
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// The storage-level query accumulated so far.
    pub fn table_query(&self) -> &TableQuery {
        &self.query
    }

    pub fn include_tree(&self) -> &IncludeTree {
        &self.includes
    }

    pub(crate) fn with_includes(mut self, includes: IncludeTree) -> Self {
        self.includes = includes;
        self
    }

    fn column(&self, property: &str) -> String {
        self.schema.storage_column(property).to_string()
    }

    fn columns<I, S>(&self, properties: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        properties
            .into_iter()
            .map(|p| self.column(p.as_ref()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    pub fn where_eq(self, property: &str, value: impl Into<Value>) -> Self {
        self.where_op(property, Operator::Eq, value)
    }

    pub fn where_op(mut self, property: &str, op: Operator, value: impl Into<Value>) -> Self {
        let column = self.column(property);
        self.query.build_where(column, op, value.into());
        self
    }

    /// Equality on every entry of `values`, all joined with `AND`.
    pub fn where_all(mut self, values: Row) -> Self {
        for (property, value) in values {
            self = self.where_eq(&property, value);
        }
        self
    }

    pub fn or_where_eq(self, property: &str, value: impl Into<Value>) -> Self {
        self.or_where_op(property, Operator::Eq, value)
    }

    pub fn or_where_op(mut self, property: &str, op: Operator, value: impl Into<Value>) -> Self {
        let column = self.column(property);
        self.query.build_or_where(column, op, value.into());
        self
    }

    /// `OR (a = .. AND b = ..)` over the entries of `values`.
    pub fn or_where_all(mut self, values: Row) -> Self {
        for (i, (property, value)) in values.into_iter().enumerate() {
            self = if i == 0 {
                self.or_where_eq(&property, value)
            } else {
                self.where_eq(&property, value)
            };
        }
        self
    }

    pub fn where_like(mut self, property: &str, pattern: impl Into<String>) -> Self {
        let column = self.column(property);
        self.query.build_where_like(column, pattern);
        self
    }

    pub fn where_ilike(mut self, property: &str, pattern: impl Into<String>) -> Self {
        let column = self.column(property);
        self.query.build_where_ilike(column, pattern);
        self
    }

    pub fn where_in<I, V>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = self.column(property);
        self.query
            .build_where_in(column, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn where_not_in<I, V>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = self.column(property);
        self.query
            .build_where_not_in(column, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn where_between(mut self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let column = self.column(property);
        self.query.build_where_between(column, low.into(), high.into());
        self
    }

    pub fn where_not_between(mut self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let column = self.column(property);
        self.query
            .build_where_not_between(column, low.into(), high.into());
        self
    }

    pub fn where_null(mut self, property: &str) -> Self {
        let column = self.column(property);
        self.query.build_where_null(column);
        self
    }

    pub fn where_not_null(mut self, property: &str) -> Self {
        let column = self.column(property);
        self.query.build_where_not_null(column);
        self
    }

    // ------------------------------------------------------------------
    // Shape and window
    // ------------------------------------------------------------------

    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = self.columns(properties);
        self.query.build_select(columns);
        self
    }

    /// Distinct rows over `properties`; they also become the projection.
    pub fn distinct<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = self.columns(properties);
        self.query.build_select(columns).build_distinct();
        self
    }

    pub fn group_by<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = self.columns(properties);
        self.query.build_group_by(columns);
        self
    }

    pub fn order_by(mut self, property: &str, direction: Direction) -> Self {
        let column = self.column(property);
        self.query.build_order_by(column, direction);
        self
    }

    pub fn having(mut self, property: &str, op: Operator, value: impl Into<Value>) -> Self {
        let column = self.column(property);
        self.query.build_having(column, op, value.into());
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.query.build_skip(count);
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.query.build_limit(count);
        self
    }

    // ------------------------------------------------------------------
    // Includes
    // ------------------------------------------------------------------

    /// Eager-load the relation at dotted `path`, e.g. `"posts.comments"`.
    ///
    /// # Errors
    ///
    /// [`LifeError::RelationNotFound`] if a segment names no relation of the
    /// entity it is looked up on. The check happens here, before any query.
    pub fn includes(mut self, path: &str) -> Result<Self, LifeError> {
        self.includes.insert(&self.schema, path, None)?;
        Ok(self)
    }

    /// Like [`includes`](Self::includes), with `callback` customizing the query
    /// issued for the first segment of `path`.
    pub fn includes_with<F>(mut self, path: &str, callback: F) -> Result<Self, LifeError>
    where
        F: Fn(QueryBuilder) -> Result<QueryBuilder, LifeError> + Send + Sync + 'static,
    {
        let callback: IncludeCallback = Arc::new(callback);
        self.includes.insert(&self.schema, path, Some(callback))?;
        Ok(self)
    }
}
