use std::fmt;

/// Errors raised while binding, fetching or mutating a table.
///
/// None of these leave the adapter in a broken state; the caller decides
/// whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The bound table is not listed by the database.
    TableNotFound { table: String, database: String },
    /// Fetching the table's rows failed.
    Read(String),
    /// Inserting a record failed.
    Insert {
        message: String,
        database: String,
        table: String,
    },
    RowOutOfRange { row: usize, rows: usize },
    NoSuchColumn(String),
    /// The backend only accepts writes through the edit role.
    ReadOnlyRole(i32),
    /// No database or table has been bound yet.
    NotBound,
    /// Error reported by the storage driver.
    Driver(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::TableNotFound { table, database } => {
                write!(f, "cannot open table '{}' in '{}'", table, database)
            }
            TableError::Read(message) => write!(f, "read record error: {}", message),
            TableError::Insert {
                message,
                database,
                table,
            } => write!(
                f,
                "insert record failed: {} ({}/{})",
                message, database, table
            ),
            TableError::RowOutOfRange { row, rows } => {
                write!(f, "row {} out of range (row count {})", row, rows)
            }
            TableError::NoSuchColumn(column) => write!(f, "no such column: {}", column),
            TableError::ReadOnlyRole(role) => write!(f, "role {} is not editable", role),
            TableError::NotBound => write!(f, "no table bound"),
            TableError::Driver(message) => write!(f, "{}", message),
            TableError::LockPoisoned(operation) => {
                write!(f, "catalog lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for TableError {}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for TableError {
    fn from(err: rusqlite::Error) -> Self {
        TableError::Driver(err.to_string())
    }
}
