//! In-memory [`Storage`] backed by per-table row vectors.
//!
//! Every call is recorded so tests can assert on exactly which lookups the
//! query builder and the eager-load resolver issued.

use crate::error::LifeError;
use crate::query::table::{Direction, TableQuery};
use crate::sql;
use crate::storage::filter;
use crate::storage::{Row, Storage};
use sea_query::PostgresQueryBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOperation {
    Find,
    FindMany,
    Count,
    Insert,
    Update,
    Delete,
}

/// One recorded storage call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub operation: StorageOperation,
    pub table: String,
    pub query: Option<TableQuery>,
}

impl CallRecord {
    /// The PostgreSQL `SELECT` a SQL backend would issue for this call.
    /// Writes and calls without a query render nothing.
    pub fn sql(&self) -> Option<String> {
        let query = self.query.as_ref()?;
        let statement = match self.operation {
            StorageOperation::Find | StorageOperation::FindMany => sql::select(query),
            StorageOperation::Count => sql::count(query),
            _ => return None,
        };
        Some(statement.to_string(PostgresQueryBuilder))
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

impl Table {
    fn assign_key(&mut self, row: &mut Row, key: &str) {
        match row.get(key).and_then(Value::as_i64) {
            Some(explicit) => self.next_id = self.next_id.max(explicit),
            None if row.get(key).map_or(true, Value::is_null) => {
                self.next_id += 1;
                row.insert(key.to_string(), Value::from(self.next_id));
            }
            None => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: Mutex<HashMap<String, Table>>,
    calls: Mutex<Vec<CallRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put rows into `table` without recording a call. Integer `key` values
    /// advance the auto-increment counter; missing ones are assigned.
    pub fn seed(&self, table: &str, key: &str, rows: Vec<Row>) -> Result<(), LifeError> {
        let mut tables = self.tables()?;
        let entry = tables.entry(table.to_string()).or_default();
        for mut row in rows {
            entry.assign_key(&mut row, key);
            entry.rows.push(row);
        }
        Ok(())
    }

    /// Snapshot of the rows currently stored in `table`.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>, LifeError> {
        Ok(self
            .tables()?
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default())
    }

    pub fn calls(&self) -> Result<Vec<CallRecord>, LifeError> {
        Ok(self.call_log()?.clone())
    }

    /// Recorded calls that touched `table`.
    pub fn calls_on(&self, table: &str) -> Result<Vec<CallRecord>, LifeError> {
        Ok(self
            .call_log()?
            .iter()
            .filter(|c| c.table == table)
            .cloned()
            .collect())
    }

    pub fn clear_calls(&self) -> Result<(), LifeError> {
        self.call_log()?.clear();
        Ok(())
    }

    fn tables(&self) -> Result<MutexGuard<'_, HashMap<String, Table>>, LifeError> {
        self.tables
            .lock()
            .map_err(|e| LifeError::storage(format!("Failed to lock memory tables: {e}")))
    }

    fn call_log(&self) -> Result<MutexGuard<'_, Vec<CallRecord>>, LifeError> {
        self.calls
            .lock()
            .map_err(|e| LifeError::storage(format!("Failed to lock call log: {e}")))
    }

    fn record(&self, operation: StorageOperation, table: &str, query: Option<&TableQuery>) -> Result<(), LifeError> {
        self.call_log()?.push(CallRecord {
            operation,
            table: table.to_string(),
            query: query.cloned(),
        });
        Ok(())
    }

    fn select(&self, query: &TableQuery) -> Result<Vec<Row>, LifeError> {
        let tables = self.tables()?;
        let mut rows: Vec<Row> = tables
            .get(query.table_name())
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|r| filter::matches(r, query.clauses()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if !query.group_by_columns().is_empty() {
            rows = group(rows, query);
        }

        if !query.orders().is_empty() {
            rows.sort_by(|a, b| {
                for (column, direction) in query.orders() {
                    let null = Value::Null;
                    let ord = filter::sort_order(
                        a.get(column).unwrap_or(&null),
                        b.get(column).unwrap_or(&null),
                    );
                    let ord = match direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord.is_ne() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        if !query.columns().is_empty() {
            rows = rows
                .into_iter()
                .map(|row| {
                    query
                        .columns()
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                        .collect()
                })
                .collect();
        }

        if query.is_distinct() {
            let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
            for row in rows {
                if !unique.contains(&row) {
                    unique.push(row);
                }
            }
            rows = unique;
        }

        let skip = query.skip().unwrap_or(0) as usize;
        let limit = query.limit().map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(limit).collect())
    }
}

/// Collapse rows into one representative per group, then apply `HAVING`.
///
/// Aggregates are not computed; the only aggregate `HAVING` understands is
/// `count(*)`, the size of the group.
fn group(rows: Vec<Row>, query: &TableQuery) -> Vec<Row> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (Row, u64)> = HashMap::new();

    for row in rows {
        let key: Vec<&Value> = query
            .group_by_columns()
            .iter()
            .map(|c| row.get(c).unwrap_or(&Value::Null))
            .collect();
        let key = serde_json::to_string(&key).unwrap_or_default();
        match groups.get_mut(&key) {
            Some((_, count)) => *count += 1,
            None => {
                order.push(key.clone());
                groups.insert(key, (row, 1));
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|(row, count)| {
            query.havings().iter().all(|h| {
                let actual = if h.column.eq_ignore_ascii_case("count(*)") {
                    Value::from(*count)
                } else {
                    row.get(&h.column).cloned().unwrap_or(Value::Null)
                };
                filter::compare(&actual, h.op, &h.value)
            })
        })
        .map(|(row, _)| row)
        .collect()
}

impl Storage for MemoryStorage {
    fn find(&self, query: &TableQuery) -> Result<Option<Row>, LifeError> {
        self.record(StorageOperation::Find, query.table_name(), Some(query))?;
        let mut first = query.clone();
        first.build_limit(1);
        Ok(self.select(&first)?.into_iter().next())
    }

    fn find_many(&self, query: &TableQuery) -> Result<Vec<Row>, LifeError> {
        self.record(StorageOperation::FindMany, query.table_name(), Some(query))?;
        self.select(query)
    }

    fn count(&self, query: &TableQuery) -> Result<u64, LifeError> {
        self.record(StorageOperation::Count, query.table_name(), Some(query))?;
        Ok(self.select(query)?.len() as u64)
    }

    fn insert(&self, table: &str, mut values: Row, returning_key: &str) -> Result<Vec<Value>, LifeError> {
        self.record(StorageOperation::Insert, table, None)?;
        let mut tables = self.tables()?;
        let entry = tables.entry(table.to_string()).or_default();
        entry.assign_key(&mut values, returning_key);
        let key = values.get(returning_key).cloned().unwrap_or(Value::Null);
        entry.rows.push(values);
        Ok(vec![key])
    }

    fn update(&self, query: &TableQuery, values: Row, returning_key: &str) -> Result<Vec<Value>, LifeError> {
        self.record(StorageOperation::Update, query.table_name(), Some(query))?;
        let mut tables = self.tables()?;
        let Some(table) = tables.get_mut(query.table_name()) else {
            return Ok(Vec::new());
        };

        let mut keys = Vec::new();
        for row in table.rows.iter_mut().filter(|r| filter::matches(r, query.clauses())) {
            for (column, value) in &values {
                row.insert(column.clone(), value.clone());
            }
            keys.push(row.get(returning_key).cloned().unwrap_or(Value::Null));
        }
        Ok(keys)
    }

    fn delete(&self, query: &TableQuery) -> Result<u64, LifeError> {
        self.record(StorageOperation::Delete, query.table_name(), Some(query))?;
        let mut tables = self.tables()?;
        let Some(table) = tables.get_mut(query.table_name()) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|r| !filter::matches(r, query.clauses()));
        Ok((before - table.rows.len()) as u64)
    }
}
