use serde_json::json;
use sql_table_model::{
    InMemoryCatalog, InMemoryTable, Lifecycle, ModelEvent, TableError, TableModel,
    TableModelConfig, BOOKS_SEED,
};

use crate::support::{books_model, items_catalog, record_events, BrokenFetch, ITEMS_DB};

#[test]
fn empty_or_same_table_is_ignored() {
    let (_, mut model) = books_model();
    let events = record_events(&mut model);

    model.set_table("");
    model.set_table("   ");
    model.set_table("BOOKS");
    model.set_table(" Books ");

    assert!(events.lock().unwrap().is_empty());
    assert_eq!(model.table_name(), "books");
    assert_eq!(model.row_count(), BOOKS_SEED.len());
}

#[test]
fn database_name_change_is_signalled_once() {
    let (_, mut model) = books_model();
    let events = record_events(&mut model);

    model.set_database_name(":MEMORY:");
    assert!(events.lock().unwrap().is_empty());

    model.set_database_name("library.db");
    model.set_database_name("LIBRARY.db");
    assert_eq!(*events.lock().unwrap(), vec![ModelEvent::DatabaseNameChanged]);

    // identifier only; nothing re-fetched yet
    assert_eq!(model.database_name(), "library.db");
    assert_eq!(model.backend().catalog().table_names("library.db").unwrap().len(), 0);
    assert_eq!(model.row_count(), BOOKS_SEED.len());
}

#[test]
fn select_on_missing_table_fails() {
    let (catalog, mut model) = books_model();
    let events = record_events(&mut model);
    catalog.drop_table(":memory:", "books").unwrap();

    let err = model.select().unwrap_err();
    assert_eq!(
        err,
        TableError::TableNotFound {
            table: "books".into(),
            database: ":memory:".into()
        }
    );
    assert_eq!(model.row_count(), BOOKS_SEED.len());

    let message = model.error_string();
    assert!(message.contains("books"));
    assert!(message.contains(":memory:"));
    assert_eq!(*events.lock().unwrap(), vec![ModelEvent::Error(message)]);

    assert!(model.refresh().is_err());
}

#[test]
fn fetch_failure_carries_driver_text() {
    let catalog = items_catalog(3);
    let mut model = TableModel::from_config(
        BrokenFetch {
            inner: InMemoryTable::new(catalog),
        },
        &TableModelConfig::new().with_database(ITEMS_DB).with_table("items"),
    );
    let events = record_events(&mut model);

    let err = model.component_complete().unwrap_err();
    assert_eq!(err, TableError::Read("disk I/O error".into()));
    assert_eq!(model.error_string(), "read record error: disk I/O error");
    assert!(events
        .lock()
        .unwrap()
        .contains(&ModelEvent::Error("read record error: disk I/O error".into())));
    assert_eq!(model.row_count(), 0);
}

#[test]
fn successful_fetch_clears_recorded_error() {
    let (catalog, mut model) = books_model();
    catalog.drop_table(":memory:", "books").unwrap();
    assert!(model.select().is_err());
    assert!(!model.error_string().is_empty());

    restore_books(&catalog);
    model.select().unwrap();
    assert_eq!(model.error_string(), "");
}

fn restore_books(catalog: &InMemoryCatalog) {
    sql_table_model::seed_books(catalog, ":memory:").unwrap();
}

#[test]
fn rebinding_refetches_new_table() {
    let catalog = items_catalog(4);
    sql_table_model::seed_books(&catalog, ITEMS_DB).unwrap();

    let config = TableModelConfig::from_json(r#"{"database": "inventory", "table": "items"}"#)
        .unwrap();
    let mut model = TableModel::from_config(InMemoryTable::new(catalog), &config);
    model.component_complete().unwrap();
    assert_eq!(model.row_count(), 4);

    let events = record_events(&mut model);
    model.set_table("books");
    assert_eq!(model.table_name(), "books");
    assert_eq!(model.row_count(), BOOKS_SEED.len());
    assert_eq!(model.role_names().len(), 8);

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&ModelEvent::ModelReset));
    assert_eq!(events.last(), Some(&ModelEvent::TableChanged));
}

#[test]
fn table_set_before_database_binds_on_completion() {
    let catalog = items_catalog(2);
    let mut model = TableModel::new(InMemoryTable::new(catalog));
    model.class_begin();
    model.set_table("items");
    // no database yet, so nothing is bound
    assert_eq!(model.table_name(), "");
    assert!(!model.is_bound());

    model.set_database_name(ITEMS_DB);
    model.component_complete().unwrap();
    assert_eq!(model.table_name(), "items");
    assert_eq!(model.row_count(), 2);
}

#[test]
fn table_without_database_cannot_open() {
    let mut model = TableModel::new(InMemoryTable::new(InMemoryCatalog::new()));
    model.set_table("books");
    let err = model.component_complete().unwrap_err();
    assert!(matches!(err, TableError::TableNotFound { .. }));
    assert_eq!(model.error_string(), "cannot open table 'books' in ''");
}

#[test]
fn listeners_can_be_removed() {
    let (_, mut model) = books_model();
    let events = record_events(&mut model);
    let title = model.role_for_name("title").unwrap();
    let id = model.on(|_| {});

    assert!(model.off(id));
    model.set_data(0, title, json!("x")).unwrap();
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn missing_table_error_names_the_open_database() {
    let (catalog, mut model) = books_model();
    catalog.drop_table(":memory:", "books").unwrap();
    // stored only; nothing is opened until the table is bound again
    model.set_database_name("elsewhere.db");

    let err = model.select().unwrap_err();
    assert_eq!(
        err,
        TableError::TableNotFound {
            table: "books".into(),
            database: ":memory:".into()
        }
    );
    assert!(!model.error_string().contains("elsewhere.db"));
}
