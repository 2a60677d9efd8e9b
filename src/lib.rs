//! Row adapter exposing relational tables to declarative list/table views.
//!
//! A [`TableModel`] binds one table of a [`TableBackend`] and serves its
//! cells by `(row, role)`: every column gets a role id, the check-state
//! role reads and writes an optional shared [`SelectionModel`]. Inserted
//! rows start out [`RowState::Pending`]; removal may be a soft delete that
//! [`TableModel::recover_row`] undoes by clearing `deleted_at`.

mod backend;
mod config;
mod error;
mod event_emitter;
mod memory;
mod model;
mod record;
pub mod role;
mod selection;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backend::{Removal, TableBackend, DEFAULT_DATABASE, DEFAULT_TABLE};
pub use config::TableModelConfig;
pub use error::TableError;
pub use event_emitter::{EventEmitter, ListenerId, ModelEvent};
pub use memory::{
    books_schema, seed_books, ColumnSchema, InMemoryCatalog, InMemoryTable, TableSchema,
    BOOKS_SEED,
};
pub use model::{Lifecycle, TableModel, DELETED_AT_FIELD, STATE_FIELD};
pub use record::{Field, Record, RowState};
pub use selection::{RowSelection, SelectionModel};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTable;
