//! Records - one row's worth of named fields.
//!
//! A [`Record`] obtained from [`TableBackend::record`](crate::TableBackend::record)
//! is a template: every field carries the column's name and schema default.
//! Only fields marked *generated* are written when the record is inserted;
//! the rest are left to the database defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle value stored in a row's `state` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum RowState {
    /// Inserted by the view, not yet accepted.
    Pending = 1,
    Active = 2,
}

impl RowState {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_i64()? {
            1 => Some(RowState::Pending),
            2 => Some(RowState::Active),
            _ => None,
        }
    }
}

impl From<RowState> for Value {
    fn from(state: RowState) -> Self {
        Value::from(state.as_i64())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
    /// Whether the field is sent to the database on insert.
    pub generated: bool,
    /// Column is NOT NULL.
    #[serde(default)]
    pub required: bool,
    /// Schema default, if the column declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            value: Value::Null,
            generated: true,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default = default;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<Field>) -> Self {
        Record { fields }
    }

    pub fn append(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|f| f.name.as_str())
    }

    /// Position of the field called `name`, compared case-insensitively.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.index_of(name).map(|i| &self.fields[i].value)
    }

    /// Sets the named field's value. Returns `false` if there is no such field.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.fields[i].value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn set_generated(&mut self, name: &str, generated: bool) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.fields[i].generated = generated;
                true
            }
            None => false,
        }
    }

    pub fn set_all_generated(&mut self, generated: bool) {
        for field in &mut self.fields {
            field.generated = generated;
        }
    }

    pub fn is_generated(&self, name: &str) -> bool {
        self.index_of(name)
            .map(|i| self.fields[i].generated)
            .unwrap_or(false)
    }

    /// Fields that will actually be written on insert.
    pub fn generated_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.generated)
    }
}
