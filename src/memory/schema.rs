use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{Field, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub not_null: bool,
    /// Filled from a per-table counter when inserted as null.
    #[serde(default)]
    pub auto_increment: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnSchema {
            name: name.into(),
            default: None,
            not_null: false,
            auto_increment: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    /// Column stamped with a timestamp instead of deleting the row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete: Option<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        TableSchema {
            name: name.into(),
            columns: Vec::new(),
            soft_delete: None,
        }
    }

    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    pub fn soft_delete(mut self, column: impl Into<String>) -> Self {
        self.soft_delete = Some(column.into());
        self
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn soft_delete_index(&self) -> Option<usize> {
        self.soft_delete
            .as_deref()
            .and_then(|name| self.column_index(name))
    }

    /// Template record: column names and defaults, every field generated.
    pub fn record(&self) -> Record {
        Record::from_fields(
            self.columns
                .iter()
                .map(|c| {
                    Field::new(c.name.clone())
                        .required(c.not_null && !c.auto_increment)
                        .with_default(c.default.clone())
                })
                .collect(),
        )
    }
}
