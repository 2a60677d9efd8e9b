//! TableModel integration tests.

mod lifecycle;
mod rows;

#[cfg(feature = "sqlite")]
mod sqlite;
