//! TableModel - the row adapter between a table backend and a view.
//!
//! Views address cells by `(row, role)`. Reserved roles are handled here
//! (check state) or passed through to the backend; every other role maps
//! to one column of the bound table, see [`crate::role`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sql_table_model::role::CHECK_STATE_ROLE;
//! use sql_table_model::{InMemoryCatalog, InMemoryTable, Lifecycle, RowSelection, TableModel};
//!
//! let mut model = TableModel::new(InMemoryTable::new(InMemoryCatalog::new()));
//! model.set_selection_model(Some(Arc::new(RowSelection::new())));
//! model.component_complete()?;
//!
//! let roles = model.role_names();
//! let row = model.add()?;
//! model.set_data(row, CHECK_STATE_ROLE, true.into())?;
//! model.remove_selected();
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::backend::{Removal, TableBackend, DEFAULT_DATABASE, DEFAULT_TABLE};
use crate::config::TableModelConfig;
use crate::error::TableError;
use crate::event_emitter::{EventEmitter, ListenerId, ModelEvent};
use crate::record::RowState;
use crate::role::{
    column_for_role, is_reserved, role_for_column, CHECK_STATE_NAME, CHECK_STATE_ROLE,
    DISPLAY_ROLE, EDIT_ROLE,
};
use crate::selection::SelectionModel;

/// Column holding a row's [`RowState`].
pub const STATE_FIELD: &str = "state";
/// Column that is non-null while a row is soft deleted.
pub const DELETED_AT_FIELD: &str = "deleted_at";

/// Two-phase setup used by declarative UIs: properties are assigned between
/// `class_begin` and `component_complete`.
pub trait Lifecycle {
    fn class_begin(&mut self) {}

    fn component_complete(&mut self) -> Result<(), TableError>;
}

pub struct TableModel<B: TableBackend> {
    backend: B,
    database_name: String,
    table: String,
    error: String,
    roles: RefCell<BTreeMap<i32, String>>,
    selection: Option<Arc<dyn SelectionModel>>,
    events: EventEmitter,
    completed: bool,
}

impl<B: TableBackend> TableModel<B> {
    pub fn new(backend: B) -> Self {
        TableModel {
            backend,
            database_name: String::new(),
            table: String::new(),
            error: String::new(),
            roles: RefCell::new(BTreeMap::new()),
            selection: None,
            events: EventEmitter::new(),
            completed: false,
        }
    }

    pub fn from_config(backend: B, config: &TableModelConfig) -> Self {
        let mut model = Self::new(backend);
        if let Some(database) = &config.database {
            model.set_database_name(database);
        }
        if let Some(table) = &config.table {
            model.set_table(table);
        }
        model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Register an observer. Events are delivered synchronously.
    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        self.events.on(listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    fn emit(&self, event: ModelEvent) {
        self.events.emit(&event);
    }

    fn report_error(&mut self, err: &TableError) {
        let message = err.to_string();
        warn!("{}", message);
        self.error = message.clone();
        self.emit(ModelEvent::Error(message));
    }

    pub fn selection_model(&self) -> Option<&Arc<dyn SelectionModel>> {
        self.selection.as_ref()
    }

    pub fn set_selection_model(&mut self, selection: Option<Arc<dyn SelectionModel>>) {
        self.selection = selection;
        self.emit(ModelEvent::SelectedRowsChanged);
    }

    // ---- binding ----

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Store a new database identifier. The backend only switches over when
    /// a table is bound again.
    pub fn set_database_name(&mut self, name: &str) {
        if same_name(name, &self.database_name) {
            return;
        }
        debug!("database name {:?} -> {:?}", self.database_name, name);
        self.database_name = name.to_string();
        self.emit(ModelEvent::DatabaseNameChanged);
    }

    /// Table bound in the backend, which may lag behind the identifier set
    /// through [`set_table`](Self::set_table) until a database is known.
    pub fn table_name(&self) -> &str {
        self.backend.table_name()
    }

    pub fn set_table(&mut self, name: &str) {
        let table = name.trim();
        if table.is_empty() || same_name(table, &self.table) {
            return;
        }
        debug!("table {:?} -> {:?}", self.table, table);
        self.table = table.to_string();

        if !self.database_name.is_empty() && self.bind().is_ok() && self.completed {
            // failures are already reported through the error channel
            let _ = self.select();
        }
        self.emit(ModelEvent::TableChanged);
    }

    pub fn is_bound(&self) -> bool {
        !self.database_name.is_empty() && !self.table.is_empty()
    }

    fn bind(&mut self) -> Result<(), TableError> {
        if !self.database_name.is_empty() && self.backend.database_name() != self.database_name {
            if let Err(err) = self.backend.set_database_name(&self.database_name) {
                self.report_error(&err);
                return Err(err);
            }
        }
        self.backend.set_table(&self.table);
        self.roles.borrow_mut().clear();
        self.reset();
        Ok(())
    }

    /// Row indices do not survive a reset, so the selection goes with them.
    fn reset(&self) {
        self.emit(ModelEvent::ModelReset);
        if let Some(selection) = &self.selection {
            selection.clear();
            self.emit(ModelEvent::SelectedRowsChanged);
        }
    }

    // ---- roles ----

    /// Role ids the view may use: the check state plus one per column.
    pub fn role_names(&self) -> BTreeMap<i32, String> {
        let record = self.backend.record();
        let mut roles = BTreeMap::new();
        roles.insert(CHECK_STATE_ROLE, CHECK_STATE_NAME.to_string());
        for (column, field) in record.fields().enumerate() {
            roles.insert(role_for_column(column), field.name.clone());
        }
        *self.roles.borrow_mut() = roles.clone();
        roles
    }

    pub fn role_for_name(&self, name: &str) -> Option<i32> {
        if self.roles.borrow().is_empty() {
            self.role_names();
        }
        self.roles
            .borrow()
            .iter()
            .find(|(_, role_name)| role_name.as_str() == name)
            .map(|(role, _)| *role)
    }

    // ---- cells ----

    pub fn row_count(&self) -> usize {
        self.backend.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.backend.column_count()
    }

    fn is_valid_row(&self, row: usize) -> bool {
        row < self.backend.row_count()
    }

    pub fn data(&self, row: usize, role: i32) -> Value {
        if !self.is_valid_row(row) {
            return Value::Null;
        }
        if role == CHECK_STATE_ROLE {
            let selected = self
                .selection
                .as_ref()
                .map_or(false, |selection| selection.is_selected(row));
            return Value::Bool(selected);
        }
        if is_reserved(role) {
            return self.backend.data(row, 0, role);
        }
        match column_for_role(role) {
            Some(column) => self.backend.data(row, column, DISPLAY_ROLE),
            None => Value::Null,
        }
    }

    pub fn set_data(&mut self, row: usize, role: i32, value: Value) -> Result<(), TableError> {
        let rows = self.backend.row_count();
        if row >= rows {
            return Err(TableError::RowOutOfRange { row, rows });
        }
        if role == CHECK_STATE_ROLE {
            let Some(selection) = &self.selection else {
                return Ok(());
            };
            selection.set_selected(row, is_truthy(&value));
            self.emit(ModelEvent::SelectedRowsChanged);
            self.emit(ModelEvent::DataChanged {
                row,
                roles: vec![role],
            });
            return Ok(());
        }
        if is_reserved(role) {
            self.backend.set_data(row, 0, value, role)?;
            self.emit(ModelEvent::DataChanged {
                row,
                roles: vec![role],
            });
            return Ok(());
        }
        let column = column_for_role(role)
            .ok_or_else(|| TableError::NoSuchColumn(role.to_string()))?;
        if let Err(err) = self.backend.set_data(row, column, value, EDIT_ROLE) {
            debug!("write to row {} role {} failed: {}", row, role, err);
            return Err(err);
        }
        self.emit(ModelEvent::DataChanged {
            row,
            roles: vec![role],
        });
        Ok(())
    }

    // ---- fetch ----

    pub fn select(&mut self) -> Result<(), TableError> {
        self.refresh()
    }

    pub fn refresh(&mut self) -> Result<(), TableError> {
        let bound = self.backend.table_name().to_string();
        let exists = self
            .backend
            .tables()
            .map(|tables| tables.iter().any(|t| *t == bound))
            .unwrap_or(false);
        if bound.is_empty() || !exists {
            let err = TableError::TableNotFound {
                table: bound,
                database: self.backend.database_name().to_string(),
            };
            self.report_error(&err);
            return Err(err);
        }

        if let Err(err) = self.backend.select() {
            let err = TableError::Read(err.to_string());
            self.report_error(&err);
            return Err(err);
        }

        self.error.clear();
        self.roles.borrow_mut().clear();
        debug!("fetched {} rows from {}", self.backend.row_count(), bound);
        self.reset();
        Ok(())
    }

    // ---- insert ----

    /// Append a pending row. Returns its index.
    pub fn add(&mut self) -> Result<usize, TableError> {
        self.insert(self.row_count())
    }

    /// Insert a pending row at `row`, every other column left to the
    /// database defaults.
    pub fn insert(&mut self, row: usize) -> Result<usize, TableError> {
        let mut record = self.backend.record();
        record.set_all_generated(false);
        if record.set_value(STATE_FIELD, RowState::Pending) {
            record.set_generated(STATE_FIELD, true);
        } else {
            debug!("table {} has no {} column", self.table, STATE_FIELD);
        }

        if let Err(err) = self.backend.insert_record(row, record) {
            let err = TableError::Insert {
                message: err.to_string(),
                database: self.database_name.clone(),
                table: self.table.clone(),
            };
            // insert failures accumulate
            if !self.error.is_empty() {
                self.error.push_str("; ");
            }
            self.error.push_str(&err.to_string());
            debug!("{}", self.error);
            self.emit(ModelEvent::Error(self.error.clone()));
            return Err(err);
        }

        if let Some(selection) = &self.selection {
            selection.rows_inserted(row);
        }
        self.emit(ModelEvent::RowsInserted {
            first: row,
            last: row,
        });
        Ok(row)
    }

    // ---- remove / recover ----

    fn remove_from_backend(&mut self, row: usize) -> Result<Removal, TableError> {
        let removal = self.backend.remove_row(row).map_err(|err| {
            debug!("remove row {} failed: {}", row, err);
            err
        })?;
        match removal {
            Removal::Deleted => self.emit(ModelEvent::RowsRemoved {
                first: row,
                last: row,
            }),
            Removal::Retained => self.emit(ModelEvent::DataChanged {
                row,
                roles: Vec::new(),
            }),
        }
        Ok(removal)
    }

    /// Remove `row`. Pending rows are removable too.
    pub fn remove(&mut self, row: usize) -> Result<Removal, TableError> {
        let removal = self.remove_from_backend(row)?;
        if removal == Removal::Deleted {
            if let Some(selection) = &self.selection {
                selection.rows_removed(row);
            }
        }
        Ok(removal)
    }

    /// Remove every selected row, highest first so earlier removals do not
    /// shift rows still waiting. Returns how many were removed.
    pub fn remove_selected(&mut self) -> usize {
        self.for_each_selected(|model, row| model.remove_from_backend(row))
    }

    /// Clear the row's `deleted_at` marker.
    pub fn recover_row(&mut self, row: usize) -> Result<(), TableError> {
        let role = self
            .role_for_name(DELETED_AT_FIELD)
            .ok_or_else(|| TableError::NoSuchColumn(DELETED_AT_FIELD.to_string()))?;
        self.set_data(row, role, Value::Null)
    }

    pub fn recover_selected(&mut self) -> usize {
        self.for_each_selected(|model, row| model.recover_row(row).map(|_| Removal::Retained))
    }

    fn for_each_selected<F>(&mut self, mut action: F) -> usize
    where
        F: FnMut(&mut Self, usize) -> Result<Removal, TableError>,
    {
        let Some(selection) = self.selection.clone() else {
            return 0;
        };
        let mut rows = selection.selected_rows();
        rows.sort_unstable();
        rows.dedup();

        let mut total = 0;
        while let Some(row) = rows.pop() {
            if let Ok(outcome) = action(self, row) {
                selection.deselect(row);
                if outcome == Removal::Deleted {
                    selection.rows_removed(row);
                }
                total += 1;
            }
        }
        if total > 0 {
            self.emit(ModelEvent::SelectedRowsChanged);
        }
        total
    }

    // ---- derived ----

    pub fn selected_rows(&self) -> usize {
        self.selection
            .as_ref()
            .map_or(0, |selection| selection.selected_count())
    }

    /// Last recorded error, else the backend's last driver error.
    pub fn error_string(&self) -> String {
        if self.error.is_empty() {
            self.backend.last_error()
        } else {
            self.error.clone()
        }
    }
}

impl<B: TableBackend> Lifecycle for TableModel<B> {
    fn class_begin(&mut self) {
        debug!("class begin");
    }

    fn component_complete(&mut self) -> Result<(), TableError> {
        debug!("component complete");
        if self.database_name.is_empty() && self.table.is_empty() {
            if let Err(err) = self.backend.open_default_dataset() {
                self.report_error(&err);
                return Err(err);
            }
            self.database_name = DEFAULT_DATABASE.to_string();
            self.table = DEFAULT_TABLE.to_string();
        }
        self.completed = true;
        self.bind()?;
        debug!(
            "database: {}, table: {}",
            self.backend.database_name(),
            self.backend.table_name()
        );
        self.select()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Truthiness used for check-state writes.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
