//! Lowering of [`TableQuery`] into `sea_query` statements.
//!
//! SQL-backed [`Storage`](crate::storage::Storage) implementations build their
//! statements here so that every backend interprets a query the same way the
//! in-memory store does: clauses form OR-groups of AND-chains, so `AND` binds
//! tighter than `OR`.
//!
//! # Example
//!
//! ```
//! use lifeline::query::{Operator, TableQuery};
//! use lifeline::sql;
//! use sea_query::PostgresQueryBuilder;
//! use serde_json::json;
//!
//! let mut query = TableQuery::table("users");
//! query.build_where("name", Operator::Eq, json!("Ada")).build_limit(1);
//! let sql = sql::select(&query).to_string(PostgresQueryBuilder);
//! assert!(sql.starts_with(r#"SELECT * FROM "users""#));
//! ```

use crate::error::LifeError;
use crate::query::table::{Connective, Direction, Operator, Predicate, TableQuery};
use crate::storage::Row;
use sea_query::{
    Asterisk, Condition, DeleteStatement, DynIden, Expr, ExprTrait, Func, InsertStatement, Order,
    SelectStatement, UpdateStatement,
};
use serde_json::Value as Json;

fn iden(name: &str) -> DynIden {
    DynIden::from(name.to_string())
}

/// Convert a row value into a bound `sea_query` value.
///
/// Scalars map onto their native SQL types; arrays and objects are bound as JSON.
pub fn value(json: &Json) -> sea_query::Value {
    match json {
        Json::Null => sea_query::Value::String(None),
        Json::Bool(b) => (*b).into(),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64().into()
            }
        }
        Json::String(s) => s.clone().into(),
        other => other.clone().into(),
    }
}

fn compare(col: Expr, op: Operator, operand: &Json) -> Expr {
    match op {
        Operator::Eq => col.eq(value(operand)),
        Operator::Ne => col.ne(value(operand)),
        Operator::Gt => col.gt(value(operand)),
        Operator::Gte => col.gte(value(operand)),
        Operator::Lt => col.lt(value(operand)),
        Operator::Lte => col.lte(value(operand)),
        Operator::Like => col.like(pattern(operand)),
        Operator::NotLike => col.not_like(pattern(operand)),
        Operator::ILike => Expr::from(Func::lower(col)).like(pattern(operand).to_lowercase()),
    }
}

fn pattern(operand: &Json) -> String {
    match operand {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn predicate(predicate: &Predicate) -> Expr {
    match predicate {
        Predicate::Compare { column, op, value: operand } => {
            compare(Expr::col(iden(column)), *op, operand)
        }
        Predicate::In { column, values, negated } => {
            let values: Vec<sea_query::Value> = values.iter().map(value).collect();
            if *negated {
                Expr::col(iden(column)).is_not_in(values)
            } else {
                Expr::col(iden(column)).is_in(values)
            }
        }
        Predicate::Between { column, low, high, negated } => {
            if *negated {
                Expr::col(iden(column)).not_between(value(low), value(high))
            } else {
                Expr::col(iden(column)).between(value(low), value(high))
            }
        }
        Predicate::Null { column, negated } => {
            if *negated {
                Expr::col(iden(column)).is_not_null()
            } else {
                Expr::col(iden(column)).is_null()
            }
        }
    }
}

/// The `WHERE` condition of `query`, or `None` when it has no clauses.
pub fn condition(query: &TableQuery) -> Option<Condition> {
    let mut groups: Vec<Condition> = Vec::new();
    for clause in query.clauses() {
        let expr = predicate(&clause.predicate);
        match groups.last_mut() {
            Some(group) if clause.connective == Connective::And => {
                *group = std::mem::replace(group, Condition::all()).add(expr);
            }
            _ => groups.push(Condition::all().add(expr)),
        }
    }
    match groups.len() {
        0 => None,
        1 => groups.pop(),
        _ => Some(groups.into_iter().fold(Condition::any(), Condition::add)),
    }
}

/// `SELECT` for reads: projection, filter, grouping, ordering and window.
pub fn select(query: &TableQuery) -> SelectStatement {
    let mut statement = SelectStatement::default();
    statement.from(iden(query.table_name()));

    if query.columns().is_empty() {
        statement.column(Asterisk);
    } else {
        statement.columns(query.columns().iter().map(|c| iden(c)));
    }
    if query.is_distinct() {
        statement.distinct();
    }
    if let Some(condition) = condition(query) {
        statement.cond_where(condition);
    }
    for column in query.group_by_columns() {
        statement.group_by_col(iden(column));
    }
    for having in query.havings() {
        let subject = if having.column.eq_ignore_ascii_case("count(*)") {
            Expr::col(Asterisk).count()
        } else {
            Expr::col(iden(&having.column))
        };
        statement.and_having(compare(subject, having.op, &having.value));
    }
    for (column, direction) in query.orders() {
        let order = match direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        };
        statement.order_by(iden(column), order);
    }
    if let Some(skip) = query.skip() {
        statement.offset(skip);
    }
    if let Some(limit) = query.limit() {
        statement.limit(limit);
    }
    statement
}

/// `SELECT COUNT(*)` over the filtered rows, ignoring the window.
pub fn count(query: &TableQuery) -> SelectStatement {
    let mut statement = SelectStatement::default();
    statement
        .from(iden(query.table_name()))
        .expr(Expr::col(Asterisk).count());
    if let Some(condition) = condition(query) {
        statement.cond_where(condition);
    }
    statement
}

/// `INSERT .. RETURNING returning_key` of one row.
///
/// # Errors
///
/// [`LifeError::Statement`] if `values` is empty.
pub fn insert(table: &str, values: &Row, returning_key: &str) -> Result<InsertStatement, LifeError> {
    if values.is_empty() {
        return Err(LifeError::Statement(format!("no values to insert into {table}")));
    }
    let mut statement = InsertStatement::default();
    statement
        .into_table(iden(table))
        .columns(values.keys().map(|c| iden(c)))
        .values(values.values().map(|v| Expr::val(value(v))))
        .map_err(|e| LifeError::Statement(format!("Failed to build insert into {table}: {e}")))?;
    statement.returning_col(iden(returning_key));
    Ok(statement)
}

/// `UPDATE .. SET values WHERE query RETURNING returning_key`.
pub fn update(query: &TableQuery, values: &Row, returning_key: &str) -> UpdateStatement {
    let mut statement = UpdateStatement::default();
    statement.table(iden(query.table_name()));
    for (column, v) in values {
        statement.value(iden(column), Expr::val(value(v)));
    }
    if let Some(condition) = condition(query) {
        statement.cond_where(condition);
    }
    statement.returning_col(iden(returning_key));
    statement
}

/// `DELETE FROM .. WHERE query`.
pub fn delete(query: &TableQuery) -> DeleteStatement {
    let mut statement = DeleteStatement::default();
    statement.from_table(iden(query.table_name()));
    if let Some(condition) = condition(query) {
        statement.cond_where(condition);
    }
    statement
}
