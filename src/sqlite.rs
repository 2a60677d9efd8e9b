//! SqliteTable - [`TableBackend`] over a `rusqlite` connection.
//!
//! Rows are addressed by `rowid`, so tables declared `WITHOUT ROWID` and
//! views are not supported. BLOB cells are exposed as base64 text.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Params};
use serde_json::Value;

use crate::backend::{
    check_edit_role, check_row, is_value_role, Removal, TableBackend, DEFAULT_DATABASE,
};
use crate::error::TableError;
use crate::memory::BOOKS_SEED;
use crate::record::{Field, Record};

const BOOKS_DDL: &str = "
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    author TEXT DEFAULT '',
    year INTEGER,
    state INTEGER NOT NULL DEFAULT 2,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    deleted_at TEXT
);
CREATE TRIGGER IF NOT EXISTS books_soft_delete BEFORE DELETE ON books
BEGIN
    UPDATE books SET deleted_at = CURRENT_TIMESTAMP WHERE id = OLD.id;
    SELECT RAISE(IGNORE);
END;
";

#[derive(Debug, Clone)]
struct SqliteColumn {
    name: String,
    required: bool,
    default: Option<Value>,
}

#[derive(Debug, Clone)]
struct SqliteRow {
    rowid: i64,
    values: Vec<Value>,
}

pub struct SqliteTable {
    conn: Option<Connection>,
    database: String,
    table: String,
    columns: Vec<SqliteColumn>,
    rows: Vec<SqliteRow>,
    last_error: String,
}

impl SqliteTable {
    pub fn new() -> Self {
        SqliteTable {
            conn: None,
            database: String::new(),
            table: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            last_error: String::new(),
        }
    }

    /// Wrap an already open connection, e.g. one the caller seeded.
    pub fn with_connection(conn: Connection, database: impl Into<String>) -> Self {
        SqliteTable {
            conn: Some(conn),
            database: database.into(),
            ..Self::new()
        }
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    fn conn(&self) -> Result<&Connection, TableError> {
        self.conn.as_ref().ok_or(TableError::NotBound)
    }

    fn track<T>(&mut self, result: Result<T, TableError>) -> Result<T, TableError> {
        if let Err(err) = &result {
            self.last_error = err.to_string();
        }
        result
    }

    fn load_columns(&self) -> Result<Vec<SqliteColumn>, TableError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(&self.table)))?;
        let columns = stmt.query_map([], |row| {
            let name: String = row.get(1)?;
            let ty: String = row.get(2)?;
            let not_null: i64 = row.get(3)?;
            let default: Option<String> = row.get(4)?;
            let pk: i64 = row.get(5)?;
            let rowid_alias = pk == 1 && ty.eq_ignore_ascii_case("INTEGER");
            Ok(SqliteColumn {
                name,
                required: not_null != 0 && !rowid_alias,
                default: default.as_deref().map(parse_default),
            })
        })?;
        let columns: rusqlite::Result<Vec<_>> = columns.collect();
        Ok(columns?)
    }

    fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn read_rows<P: Params>(&self, filter: &str, params: P) -> Result<Vec<SqliteRow>, TableError> {
        let conn = self.conn()?;
        let width = self.columns.len();
        let sql = format!(
            "SELECT rowid, {} FROM {}{}",
            self.column_list(),
            quote(&self.table),
            filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| {
            let rowid: i64 = row.get(0)?;
            let mut values = Vec::with_capacity(width);
            for i in 1..=width {
                values.push(from_sql(row.get_ref(i)?));
            }
            Ok(SqliteRow { rowid, values })
        })?;
        let rows: rusqlite::Result<Vec<_>> = rows.collect();
        Ok(rows?)
    }

    fn read_row(&self, rowid: i64) -> Result<Option<SqliteRow>, TableError> {
        Ok(self
            .read_rows(" WHERE rowid = ?1", params![rowid])?
            .into_iter()
            .next())
    }

    fn fetch(&mut self) -> Result<(), TableError> {
        self.columns = self.load_columns()?;
        if self.columns.is_empty() {
            return Err(TableError::Driver(format!("no such table: {}", self.table)));
        }
        self.rows = self.read_rows("", params![])?;
        Ok(())
    }

    fn update(&self, rowid: i64, column: usize, value: &Value) -> Result<(), TableError> {
        let name = &self
            .columns
            .get(column)
            .ok_or_else(|| TableError::NoSuchColumn(column.to_string()))?
            .name;
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE rowid = ?2",
            quote(&self.table),
            quote(name)
        );
        self.conn()?.execute(&sql, params![to_sql(value), rowid])?;
        Ok(())
    }

    fn insert(&self, record: &Record) -> Result<SqliteRow, TableError> {
        let conn = self.conn()?;
        let fields: Vec<&Field> = record.generated_fields().collect();
        if fields.is_empty() {
            conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", quote(&self.table)), [])?;
        } else {
            let names: Vec<String> = fields.iter().map(|f| quote(&f.name)).collect();
            let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(&self.table),
                names.join(", "),
                placeholders.join(", ")
            );
            conn.execute(&sql, params_from_iter(fields.iter().map(|f| to_sql(&f.value))))?;
        }
        let rowid = conn.last_insert_rowid();
        self.read_row(rowid)?
            .ok_or_else(|| TableError::Driver(format!("inserted row {} not readable", rowid)))
    }

    /// `Some(row)` when a trigger kept the row instead of deleting it.
    fn delete(&self, rowid: i64) -> Result<Option<SqliteRow>, TableError> {
        let sql = format!("DELETE FROM {} WHERE rowid = ?1", quote(&self.table));
        let changed = self.conn()?.execute(&sql, params![rowid])?;
        if changed > 0 {
            return Ok(None);
        }
        self.read_row(rowid)
    }

    fn seed_books(&self) -> Result<(), TableError> {
        let conn = self.conn()?;
        conn.execute_batch(BOOKS_DDL)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        let mut stmt = conn.prepare("INSERT INTO books (title, author, year) VALUES (?1, ?2, ?3)")?;
        for (title, author, year) in BOOKS_SEED {
            stmt.execute(params![title, author, year])?;
        }
        Ok(())
    }
}

impl Default for SqliteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBackend for SqliteTable {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn set_database_name(&mut self, name: &str) -> Result<(), TableError> {
        if self.conn.is_some() && self.database == name {
            return Ok(());
        }
        let opened = Connection::open(name).map_err(TableError::from);
        let conn = self.track(opened)?;
        debug!("opened sqlite database {}", name);
        self.conn = Some(conn);
        self.database = name.to_string();
        self.columns.clear();
        self.rows.clear();
        Ok(())
    }

    fn open_default_dataset(&mut self) -> Result<(), TableError> {
        self.set_database_name(DEFAULT_DATABASE)?;
        let seeded = self.seed_books();
        self.track(seeded)
    }

    fn tables(&self) -> Result<Vec<String>, TableError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let names: rusqlite::Result<Vec<String>> = names.collect();
        Ok(names?)
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn set_table(&mut self, name: &str) {
        self.table = name.to_string();
        self.rows.clear();
        self.last_error.clear();
        match self.load_columns() {
            Ok(columns) => self.columns = columns,
            Err(err) => {
                self.columns.clear();
                self.last_error = err.to_string();
            }
        }
    }

    fn select(&mut self) -> Result<(), TableError> {
        let fetched = self.fetch();
        self.track(fetched)?;
        self.last_error.clear();
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn record(&self) -> Record {
        Record::from_fields(
            self.columns
                .iter()
                .map(|c| {
                    Field::new(c.name.clone())
                        .required(c.required)
                        .with_default(c.default.clone())
                })
                .collect(),
        )
    }

    fn data(&self, row: usize, column: usize, role: i32) -> Value {
        if !is_value_role(role) {
            return Value::Null;
        }
        self.rows
            .get(row)
            .and_then(|r| r.values.get(column))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set_data(
        &mut self,
        row: usize,
        column: usize,
        value: Value,
        role: i32,
    ) -> Result<(), TableError> {
        check_edit_role(role)?;
        check_row(row, self.rows.len())?;
        let updated = self.update(self.rows[row].rowid, column, &value);
        self.track(updated)?;
        self.rows[row].values[column] = value;
        Ok(())
    }

    fn insert_record(&mut self, row: usize, record: Record) -> Result<(), TableError> {
        if row > self.rows.len() {
            return Err(TableError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            });
        }
        let inserted = self.insert(&record);
        let inserted = self.track(inserted)?;
        self.rows.insert(row, inserted);
        Ok(())
    }

    fn remove_row(&mut self, row: usize) -> Result<Removal, TableError> {
        check_row(row, self.rows.len())?;
        let deleted = self.delete(self.rows[row].rowid);
        match self.track(deleted)? {
            Some(kept) => {
                self.rows[row] = kept;
                Ok(Removal::Retained)
            }
            None => {
                self.rows.remove(row);
                Ok(Removal::Deleted)
            }
        }
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn parse_default(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return Value::Number(n);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::String(raw[1..raw.len() - 1].replace("''", "'"));
    }
    if raw.eq_ignore_ascii_case("NULL") {
        return Value::Null;
    }
    // expression such as CURRENT_TIMESTAMP
    Value::String(raw.to_string())
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
