//! Storage-level query handle.
//!
//! A [`TableQuery`] is what the query builder hands to a [`Storage`](crate::storage::Storage):
//! a table name plus accumulated predicates, projection, grouping, ordering and window.
//! Column names in a `TableQuery` are storage names; property-to-column translation
//! happens before anything reaches this type.
//!
//! The `build_*` methods mutate in place and return `&mut Self`, the way
//! `sea_query::SelectStatement` is driven.

use serde_json::Value;
use std::fmt;

/// Comparison operator of a predicate or `HAVING` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    NotLike,
}

impl Operator {
    /// Parse the textual operator accepted by `where_op` and `having`.
    ///
    /// Keywords are case-insensitive; `<>` and `!=` both mean [`Operator::Ne`].
    pub fn parse(op: &str) -> Option<Self> {
        let op = match op.trim().to_lowercase().as_str() {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "not like" => Operator::NotLike,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parse `"asc"` / `"desc"` in any case. Anything else is ascending.
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

/// How a predicate joins the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// A single row predicate over a storage column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Between { column, .. }
            | Predicate::Null { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub connective: Connective,
    pub predicate: Predicate,
}

/// `HAVING column op value`, applied after grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Having {
    pub column: String,
    pub op: Operator,
    pub value: Value,
}

/// Query handle bound to one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableQuery {
    table: String,
    clauses: Vec<Clause>,
    columns: Vec<String>,
    distinct: bool,
    group_by: Vec<String>,
    order_by: Vec<(String, Direction)>,
    having: Vec<Having>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl TableQuery {
    /// Start a query against `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    fn push(&mut self, connective: Connective, predicate: Predicate) -> &mut Self {
        self.clauses.push(Clause {
            connective,
            predicate,
        });
        self
    }

    pub fn build_where(&mut self, column: impl Into<String>, op: Operator, value: Value) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::Compare {
                column: column.into(),
                op,
                value,
            },
        )
    }

    pub fn build_or_where(&mut self, column: impl Into<String>, op: Operator, value: Value) -> &mut Self {
        self.push(
            Connective::Or,
            Predicate::Compare {
                column: column.into(),
                op,
                value,
            },
        )
    }

    pub fn build_where_like(&mut self, column: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.build_where(column, Operator::Like, Value::String(pattern.into()))
    }

    pub fn build_where_ilike(&mut self, column: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.build_where(column, Operator::ILike, Value::String(pattern.into()))
    }

    pub fn build_where_in(&mut self, column: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::In {
                column: column.into(),
                values,
                negated: false,
            },
        )
    }

    pub fn build_where_not_in(&mut self, column: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::In {
                column: column.into(),
                values,
                negated: true,
            },
        )
    }

    pub fn build_where_between(&mut self, column: impl Into<String>, low: Value, high: Value) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::Between {
                column: column.into(),
                low,
                high,
                negated: false,
            },
        )
    }

    pub fn build_where_not_between(&mut self, column: impl Into<String>, low: Value, high: Value) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::Between {
                column: column.into(),
                low,
                high,
                negated: true,
            },
        )
    }

    pub fn build_where_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::Null {
                column: column.into(),
                negated: false,
            },
        )
    }

    pub fn build_where_not_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.push(
            Connective::And,
            Predicate::Null {
                column: column.into(),
                negated: true,
            },
        )
    }

    /// Restrict the projection. Calling it again appends columns.
    pub fn build_select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn build_distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    pub fn build_group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn build_order_by(&mut self, column: impl Into<String>, direction: Direction) -> &mut Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn build_having(&mut self, column: impl Into<String>, op: Operator, value: Value) -> &mut Self {
        self.having.push(Having {
            column: column.into(),
            op,
            value,
        });
        self
    }

    pub fn build_skip(&mut self, skip: u64) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    pub fn build_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Copy of this query without `skip`/`limit`, used for totals.
    pub fn without_window(&self) -> Self {
        Self {
            skip: None,
            limit: None,
            ..self.clone()
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Projected columns; empty means every column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn group_by_columns(&self) -> &[String] {
        &self.group_by
    }

    pub fn orders(&self) -> &[(String, Direction)] {
        &self.order_by
    }

    pub fn havings(&self) -> &[Having] {
        &self.having
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}
