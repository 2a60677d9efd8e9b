use serde::{Deserialize, Serialize};

/// Declarative settings for a [`TableModel`](crate::TableModel).
///
/// Leaving both fields unset makes the model fall back to the in-memory
/// `books` dataset when it completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableModelConfig {
    /// Database file name, or `:memory:`.
    pub database: Option<String>,
    pub table: Option<String>,
}

impl TableModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
