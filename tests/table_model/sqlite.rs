use std::sync::Arc;

use serde_json::json;
use sql_table_model::role::CHECK_STATE_ROLE;
use sql_table_model::{
    Lifecycle, RowSelection, RowState, SqliteTable, TableModel, TableModelConfig, BOOKS_SEED,
};

fn sqlite_books() -> TableModel<SqliteTable> {
    let mut model = TableModel::new(SqliteTable::new());
    model.set_selection_model(Some(Arc::new(RowSelection::new())));
    model.component_complete().unwrap();
    model
}

#[test]
fn falls_back_to_seeded_memory_database() {
    let model = sqlite_books();
    assert_eq!(model.database_name(), ":memory:");
    assert_eq!(model.table_name(), "books");
    assert_eq!(model.row_count(), BOOKS_SEED.len());
    assert_eq!(model.role_names().len(), 8);
}

#[test]
fn pending_insert_then_soft_delete_and_recover() {
    let mut model = sqlite_books();
    let state = model.role_for_name("state").unwrap();
    let deleted_at = model.role_for_name("deleted_at").unwrap();

    let row = model.add().unwrap();
    assert_eq!(model.data(row, state), json!(RowState::Pending.as_i64()));

    model.set_data(0, CHECK_STATE_ROLE, json!(true)).unwrap();
    model.set_data(row, CHECK_STATE_ROLE, json!(true)).unwrap();
    assert_eq!(model.remove_selected(), 2);
    assert_eq!(model.row_count(), BOOKS_SEED.len() + 1);
    assert!(model.data(0, deleted_at).is_string());

    model.set_data(0, CHECK_STATE_ROLE, json!(true)).unwrap();
    assert_eq!(model.recover_selected(), 1);
    model.refresh().unwrap();
    assert!(model.data(0, deleted_at).is_null());
    assert!(model.data(row, deleted_at).is_string());
}

#[test]
fn missing_table_in_file_database() {
    let path = std::env::temp_dir().join(format!("sql_table_model_{}.db", std::process::id()));
    let config = TableModelConfig::new()
        .with_database(path.to_string_lossy())
        .with_table("nothing_here");
    let mut model = TableModel::from_config(SqliteTable::new(), &config);

    assert!(model.component_complete().is_err());
    assert!(model.error_string().contains("nothing_here"));
    assert_eq!(model.row_count(), 0);

    let _ = std::fs::remove_file(path);
}
