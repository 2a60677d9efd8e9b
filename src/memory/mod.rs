//! In-memory backend.
//!
//! An [`InMemoryCatalog`] holds any number of named databases, each with
//! any number of tables. [`InMemoryTable`] is the [`TableBackend`] view of
//! one table in that catalog. Catalog handles are cheap to clone and share
//! storage, so a test can seed a catalog, hand a clone to the backend and
//! inspect the stored rows afterwards.
//!
//! ```ignore
//! use sql_table_model::{InMemoryCatalog, InMemoryTable, TableModel, Lifecycle};
//!
//! let catalog = InMemoryCatalog::new();
//! let mut model = TableModel::new(InMemoryTable::new(catalog.clone()));
//! model.component_complete()?; // falls back to ":memory:" / "books"
//! assert!(model.row_count() > 0);
//! ```
//!
//! [`TableBackend`]: crate::TableBackend

mod books;
mod catalog;
mod schema;
mod table;

pub use books::{books_schema, seed_books, BOOKS_SEED};
pub use catalog::InMemoryCatalog;
pub use schema::{ColumnSchema, TableSchema};
pub use table::InMemoryTable;
