use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use super::schema::TableSchema;
use crate::error::TableError;
use crate::record::Record;

/// Stored row. `key` stays fixed for the row's lifetime, like a rowid.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredRow {
    pub key: u64,
    pub values: Vec<Value>,
}

struct StoredTable {
    schema: TableSchema,
    rows: Vec<StoredRow>,
    next_key: u64,
    next_id: i64,
}

impl StoredTable {
    fn new(schema: TableSchema) -> Self {
        StoredTable {
            schema,
            rows: Vec::new(),
            next_key: 1,
            next_id: 1,
        }
    }

    fn position(&self, key: u64) -> Result<usize, TableError> {
        self.rows
            .iter()
            .position(|r| r.key == key)
            .ok_or_else(|| TableError::Driver(format!("row {} no longer exists", key)))
    }

    fn insert(&mut self, record: &Record) -> Result<StoredRow, TableError> {
        for field in record.generated_fields() {
            if self.schema.column_index(&field.name).is_none() {
                return Err(TableError::Driver(format!(
                    "table {} has no column named {}",
                    self.schema.name, field.name
                )));
            }
        }

        let mut values = Vec::with_capacity(self.schema.columns.len());
        let mut next_id = self.next_id;
        for column in &self.schema.columns {
            let explicit = record
                .index_of(&column.name)
                .and_then(|i| record.field(i))
                .filter(|f| f.generated)
                .map(|f| f.value.clone());

            let mut value = match explicit {
                Some(v) => v,
                None => column.default.clone().unwrap_or(Value::Null),
            };

            if column.auto_increment {
                match value.as_i64() {
                    Some(id) => next_id = next_id.max(id + 1),
                    None if value.is_null() => {
                        value = Value::from(next_id);
                        next_id += 1;
                    }
                    None => {}
                }
            }

            if value.is_null() && column.not_null {
                return Err(TableError::Driver(format!(
                    "NOT NULL constraint failed: {}.{}",
                    self.schema.name, column.name
                )));
            }
            values.push(value);
        }

        let row = StoredRow {
            key: self.next_key,
            values,
        };
        self.next_key += 1;
        self.next_id = next_id;
        self.rows.push(row.clone());
        Ok(row)
    }
}

type Databases = HashMap<String, HashMap<String, StoredTable>>;

/// Shared in-memory storage for any number of databases.
///
/// Clone-friendly via `Arc`; all clones see the same data.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    databases: Arc<RwLock<Databases>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Databases>, TableError> {
        self.databases
            .read()
            .map_err(|_| TableError::LockPoisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Databases>, TableError> {
        self.databases
            .write()
            .map_err(|_| TableError::LockPoisoned("write"))
    }

    fn no_such_table(table: &str) -> TableError {
        TableError::Driver(format!("no such table: {}", table))
    }

    fn with_table<T>(
        &self,
        database: &str,
        table: &str,
        f: impl FnOnce(&StoredTable) -> Result<T, TableError>,
    ) -> Result<T, TableError> {
        let databases = self.read()?;
        let stored = databases
            .get(database)
            .and_then(|tables| tables.get(table))
            .ok_or_else(|| Self::no_such_table(table))?;
        f(stored)
    }

    fn with_table_mut<T>(
        &self,
        database: &str,
        table: &str,
        f: impl FnOnce(&mut StoredTable) -> Result<T, TableError>,
    ) -> Result<T, TableError> {
        let mut databases = self.write()?;
        let stored = databases
            .get_mut(database)
            .and_then(|tables| tables.get_mut(table))
            .ok_or_else(|| Self::no_such_table(table))?;
        f(stored)
    }

    /// Create `name` if it does not exist yet.
    pub fn create_database(&self, name: &str) -> Result<(), TableError> {
        self.write()?.entry(name.to_string()).or_default();
        Ok(())
    }

    pub fn create_table(&self, database: &str, schema: TableSchema) -> Result<(), TableError> {
        let mut databases = self.write()?;
        let tables = databases.entry(database.to_string()).or_default();
        if tables.contains_key(&schema.name) {
            return Err(TableError::Driver(format!(
                "table {} already exists",
                schema.name
            )));
        }
        tables.insert(schema.name.clone(), StoredTable::new(schema));
        Ok(())
    }

    pub fn drop_table(&self, database: &str, table: &str) -> Result<bool, TableError> {
        Ok(self
            .write()?
            .get_mut(database)
            .map(|tables| tables.remove(table).is_some())
            .unwrap_or(false))
    }

    pub fn has_table(&self, database: &str, table: &str) -> bool {
        self.read()
            .map(|dbs| dbs.get(database).map_or(false, |t| t.contains_key(table)))
            .unwrap_or(false)
    }

    /// Table names of `database`, sorted. Unknown databases have none.
    pub fn table_names(&self, database: &str) -> Result<Vec<String>, TableError> {
        let databases = self.read()?;
        let mut names: Vec<String> = databases
            .get(database)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    pub fn schema(&self, database: &str, table: &str) -> Result<Option<TableSchema>, TableError> {
        Ok(self
            .read()?
            .get(database)
            .and_then(|tables| tables.get(table))
            .map(|stored| stored.schema.clone()))
    }

    /// Insert a row given as `(column, value)` pairs; other columns take
    /// their defaults. Returns the row's key.
    pub fn insert_row(
        &self,
        database: &str,
        table: &str,
        values: &[(&str, Value)],
    ) -> Result<u64, TableError> {
        self.with_table_mut(database, table, |stored| {
            let mut record = stored.schema.record();
            record.set_all_generated(false);
            for (name, value) in values {
                if !record.set_value(name, value.clone()) {
                    return Err(TableError::Driver(format!(
                        "table {} has no column named {}",
                        table, name
                    )));
                }
                record.set_generated(name, true);
            }
            stored.insert(&record).map(|row| row.key)
        })
    }

    /// Stored values of every row, in storage order.
    pub fn rows(&self, database: &str, table: &str) -> Result<Vec<Vec<Value>>, TableError> {
        self.with_table(database, table, |stored| {
            Ok(stored.rows.iter().map(|r| r.values.clone()).collect())
        })
    }

    pub(crate) fn fetch(&self, database: &str, table: &str) -> Result<Vec<StoredRow>, TableError> {
        self.with_table(database, table, |stored| Ok(stored.rows.clone()))
    }

    pub(crate) fn insert(
        &self,
        database: &str,
        table: &str,
        record: &Record,
    ) -> Result<StoredRow, TableError> {
        self.with_table_mut(database, table, |stored| stored.insert(record))
    }

    pub(crate) fn update(
        &self,
        database: &str,
        table: &str,
        key: u64,
        column: usize,
        value: Value,
    ) -> Result<(), TableError> {
        self.with_table_mut(database, table, |stored| {
            let schema_column = stored
                .schema
                .columns
                .get(column)
                .ok_or_else(|| TableError::NoSuchColumn(column.to_string()))?;
            if value.is_null() && schema_column.not_null {
                return Err(TableError::Driver(format!(
                    "NOT NULL constraint failed: {}.{}",
                    stored.schema.name, schema_column.name
                )));
            }
            let pos = stored.position(key)?;
            stored.rows[pos].values[column] = value;
            Ok(())
        })
    }

    /// Delete the row, or stamp its soft-delete column if the table has
    /// one. Returns the row's new values when it was kept.
    pub(crate) fn remove(
        &self,
        database: &str,
        table: &str,
        key: u64,
    ) -> Result<Option<Vec<Value>>, TableError> {
        self.with_table_mut(database, table, |stored| {
            let pos = stored.position(key)?;
            match stored.schema.soft_delete_index() {
                Some(column) => {
                    let stamp = chrono::Utc::now().to_rfc3339();
                    let row = &mut stored.rows[pos];
                    row.values[column] = Value::String(stamp);
                    Ok(Some(row.values.clone()))
                }
                None => {
                    stored.rows.remove(pos);
                    Ok(None)
                }
            }
        })
    }
}
