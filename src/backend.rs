//! TableBackend - the relational table a [`TableModel`](crate::TableModel) sits on.
//!
//! A backend owns the connection to one database, binds one table at a
//! time and keeps the rows of its last fetch. Writes go straight to the
//! database (field-change strategy): there is no separate submit step.

use serde_json::Value;

use crate::error::TableError;
use crate::record::Record;
use crate::role::{DISPLAY_ROLE, EDIT_ROLE};

/// Database identifier of the default in-memory dataset.
pub const DEFAULT_DATABASE: &str = ":memory:";
/// Table of the default in-memory dataset.
pub const DEFAULT_TABLE: &str = "books";

/// What a successful [`TableBackend::remove_row`] did to the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The row is gone; later rows moved up by one.
    Deleted,
    /// The database kept the row (soft delete); its cells changed in place.
    Retained,
}

pub trait TableBackend {
    fn database_name(&self) -> &str;

    /// Point the connection at another database.
    fn set_database_name(&mut self, name: &str) -> Result<(), TableError>;

    /// Create and seed the [`DEFAULT_TABLE`] in [`DEFAULT_DATABASE`] and
    /// switch the connection to it.
    fn open_default_dataset(&mut self) -> Result<(), TableError>;

    /// Tables available in the current database.
    fn tables(&self) -> Result<Vec<String>, TableError>;

    fn table_name(&self) -> &str;

    /// Bind `name` and forget the previous result set. Does not fetch.
    fn set_table(&mut self, name: &str);

    /// Fetch every row of the bound table.
    fn select(&mut self) -> Result<(), TableError>;

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize {
        self.record().count()
    }

    /// Empty record carrying the bound table's columns and defaults.
    fn record(&self) -> Record;

    /// Cell value, or `Value::Null` when out of range or for roles the
    /// backend does not serve.
    fn data(&self, row: usize, column: usize, role: i32) -> Value;

    fn set_data(
        &mut self,
        row: usize,
        column: usize,
        value: Value,
        role: i32,
    ) -> Result<(), TableError>;

    /// Insert `record` so it shows up at `row` (`row == row_count()` appends).
    fn insert_record(&mut self, row: usize, record: Record) -> Result<(), TableError>;

    fn remove_row(&mut self, row: usize) -> Result<Removal, TableError>;

    /// Text of the most recent driver error, empty if none.
    fn last_error(&self) -> String;
}

pub(crate) fn check_row(row: usize, rows: usize) -> Result<(), TableError> {
    if row < rows {
        Ok(())
    } else {
        Err(TableError::RowOutOfRange { row, rows })
    }
}

pub(crate) fn is_value_role(role: i32) -> bool {
    role == DISPLAY_ROLE || role == EDIT_ROLE
}

pub(crate) fn check_edit_role(role: i32) -> Result<(), TableError> {
    if role == EDIT_ROLE {
        Ok(())
    } else {
        Err(TableError::ReadOnlyRole(role))
    }
}
