use serde_json::{json, Value};

use super::catalog::InMemoryCatalog;
use super::schema::{ColumnSchema, TableSchema};
use crate::backend::DEFAULT_TABLE;
use crate::error::TableError;
use crate::record::RowState;

/// Rows of the default dataset: `(title, author, year)`.
pub const BOOKS_SEED: &[(&str, &str, i64)] = &[
    ("The Pragmatic Programmer", "Andrew Hunt", 1999),
    ("Structure and Interpretation of Computer Programs", "Harold Abelson", 1985),
    ("The C Programming Language", "Brian Kernighan", 1978),
    ("Design Patterns", "Erich Gamma", 1994),
    ("Refactoring", "Martin Fowler", 1999),
];

/// `books(id, title, author, year, state, created_at, deleted_at)`, soft
/// deleted through `deleted_at`.
pub fn books_schema() -> TableSchema {
    TableSchema::new(DEFAULT_TABLE)
        .column(ColumnSchema::new("id").auto_increment().not_null())
        .column(ColumnSchema::new("title").not_null().default_value(""))
        .column(ColumnSchema::new("author").default_value(""))
        .column(ColumnSchema::new("year"))
        .column(
            ColumnSchema::new("state")
                .not_null()
                .default_value(RowState::Active),
        )
        .column(ColumnSchema::new("created_at"))
        .column(ColumnSchema::new("deleted_at"))
        .soft_delete("deleted_at")
}

/// Create and fill `books` in `database` unless it already exists.
pub fn seed_books(catalog: &InMemoryCatalog, database: &str) -> Result<(), TableError> {
    if catalog.has_table(database, DEFAULT_TABLE) {
        return Ok(());
    }
    catalog.create_table(database, books_schema())?;

    let created_at = Value::String(chrono::Utc::now().to_rfc3339());
    for (title, author, year) in BOOKS_SEED {
        catalog.insert_row(
            database,
            DEFAULT_TABLE,
            &[
                ("title", json!(title)),
                ("author", json!(author)),
                ("year", json!(year)),
                ("created_at", created_at.clone()),
            ],
        )?;
    }
    Ok(())
}
