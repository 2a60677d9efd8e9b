use serde_json::Value;

use super::books::seed_books;
use super::catalog::{InMemoryCatalog, StoredRow};
use super::schema::TableSchema;
use crate::backend::{
    check_edit_role, check_row, is_value_role, Removal, TableBackend, DEFAULT_DATABASE,
};
use crate::error::TableError;
use crate::record::Record;

/// [`TableBackend`] over one table of an [`InMemoryCatalog`].
///
/// Keeps the rows of the last `select()`; edits write through to the
/// catalog and patch the cached rows in place.
pub struct InMemoryTable {
    catalog: InMemoryCatalog,
    database: String,
    table: String,
    schema: Option<TableSchema>,
    rows: Vec<StoredRow>,
    last_error: String,
}

impl InMemoryTable {
    pub fn new(catalog: InMemoryCatalog) -> Self {
        InMemoryTable {
            catalog,
            database: String::new(),
            table: String::new(),
            schema: None,
            rows: Vec::new(),
            last_error: String::new(),
        }
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    fn track<T>(&mut self, result: Result<T, TableError>) -> Result<T, TableError> {
        if let Err(err) = &result {
            self.last_error = err.to_string();
        }
        result
    }

    fn bound_key(&self, row: usize) -> Result<u64, TableError> {
        check_row(row, self.rows.len())?;
        Ok(self.rows[row].key)
    }
}

impl TableBackend for InMemoryTable {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn set_database_name(&mut self, name: &str) -> Result<(), TableError> {
        let result = self.catalog.create_database(name);
        self.track(result)?;
        self.database = name.to_string();
        self.schema = None;
        self.rows.clear();
        Ok(())
    }

    fn open_default_dataset(&mut self) -> Result<(), TableError> {
        let result = seed_books(&self.catalog, DEFAULT_DATABASE);
        self.track(result)?;
        self.set_database_name(DEFAULT_DATABASE)
    }

    fn tables(&self) -> Result<Vec<String>, TableError> {
        self.catalog.table_names(&self.database)
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn set_table(&mut self, name: &str) {
        self.table = name.to_string();
        self.rows.clear();
        self.last_error.clear();
        match self.catalog.schema(&self.database, name) {
            Ok(schema) => self.schema = schema,
            Err(err) => {
                self.schema = None;
                self.last_error = err.to_string();
            }
        }
    }

    fn select(&mut self) -> Result<(), TableError> {
        let fetched = self.catalog.fetch(&self.database, &self.table);
        let rows = self.track(fetched)?;
        let schema = self.catalog.schema(&self.database, &self.table);
        self.schema = self.track(schema)?;
        self.rows = rows;
        self.last_error.clear();
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.schema.as_ref().map_or(0, |s| s.columns.len())
    }

    fn record(&self) -> Record {
        self.schema
            .as_ref()
            .map(TableSchema::record)
            .unwrap_or_default()
    }

    fn data(&self, row: usize, column: usize, role: i32) -> Value {
        if !is_value_role(role) {
            return Value::Null;
        }
        self.rows
            .get(row)
            .and_then(|r| r.values.get(column))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set_data(
        &mut self,
        row: usize,
        column: usize,
        value: Value,
        role: i32,
    ) -> Result<(), TableError> {
        check_edit_role(role)?;
        let key = self.bound_key(row)?;
        if column >= self.column_count() {
            return Err(TableError::NoSuchColumn(column.to_string()));
        }
        let result = self
            .catalog
            .update(&self.database, &self.table, key, column, value.clone());
        self.track(result)?;
        self.rows[row].values[column] = value;
        Ok(())
    }

    fn insert_record(&mut self, row: usize, record: Record) -> Result<(), TableError> {
        if row > self.rows.len() {
            return Err(TableError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            });
        }
        let result = self.catalog.insert(&self.database, &self.table, &record);
        let stored = self.track(result)?;
        self.rows.insert(row, stored);
        Ok(())
    }

    fn remove_row(&mut self, row: usize) -> Result<Removal, TableError> {
        let key = self.bound_key(row)?;
        let result = self.catalog.remove(&self.database, &self.table, key);
        match self.track(result)? {
            Some(values) => {
                self.rows[row].values = values;
                Ok(Removal::Retained)
            }
            None => {
                self.rows.remove(row);
                Ok(Removal::Deleted)
            }
        }
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }
}
