use std::sync::Arc;

use serde_json::{json, Value};
use sql_table_model::role::CHECK_STATE_ROLE;
use sql_table_model::{
    ColumnSchema, ModelEvent, Removal, RowSelection, RowState, SelectionModel, TableError,
    TableSchema, BOOKS_SEED,
};

use crate::support::{books_model, items_catalog, items_model, labels, record_events, ITEMS_DB};

#[test]
fn add_appends_pending_row() {
    let (catalog, mut model) = books_model();
    let events = record_events(&mut model);

    let row = model.add().unwrap();
    assert_eq!(row, BOOKS_SEED.len());
    assert_eq!(model.row_count(), BOOKS_SEED.len() + 1);

    let state = model.role_for_name("state").unwrap();
    assert_eq!(RowState::from_value(&model.data(row, state)), Some(RowState::Pending));
    assert_eq!(
        *events.lock().unwrap(),
        vec![ModelEvent::RowsInserted {
            first: row,
            last: row
        }]
    );

    let stored = catalog.rows(":memory:", "books").unwrap();
    assert_eq!(stored.last().unwrap()[4], json!(RowState::Pending.as_i64()));
}

#[test]
fn insert_is_always_pending() {
    let (_, mut model) = books_model();
    let state = model.role_for_name("state").unwrap();
    let title = model.role_for_name("title").unwrap();

    // the schema default for state is Active; insert overrides it
    for row in [0, 3, model.row_count()] {
        let inserted = model.insert(row).unwrap();
        assert_eq!(inserted, row);
        assert_eq!(model.data(row, state), json!(RowState::Pending.as_i64()));
        assert_eq!(model.data(row, title), json!(""));
    }
}

#[test]
fn insert_past_end_fails_and_reports() {
    let (_, mut model) = books_model();
    let events = record_events(&mut model);
    let rows = model.row_count();

    let err = model.insert(rows + 5).unwrap_err();
    assert!(matches!(err, TableError::Insert { .. }));
    assert_eq!(model.row_count(), rows);

    let message = model.error_string();
    assert!(message.contains(":memory:"));
    assert!(message.contains("books"));
    assert_eq!(*events.lock().unwrap(), vec![ModelEvent::Error(message)]);

    // still usable
    assert!(model.add().is_ok());
}

#[test]
fn remove_selected_works_from_the_bottom_up() {
    let catalog = items_catalog(10);
    let mut model = items_model(&catalog);
    let selection = Arc::new(RowSelection::with_rows([5, 2, 7]));
    model.set_selection_model(Some(selection.clone()));
    let events = record_events(&mut model);

    assert_eq!(model.selected_rows(), 3);
    assert_eq!(model.remove_selected(), 3);

    assert_eq!(model.selected_rows(), 0);
    assert!(selection.selected_rows().is_empty());
    assert_eq!(model.row_count(), 7);

    let remaining: Vec<Value> = [0, 1, 3, 4, 6, 8, 9]
        .iter()
        .map(|i| json!(format!("item-{}", i)))
        .collect();
    assert_eq!(labels(&model), remaining);
    assert_eq!(catalog.rows(ITEMS_DB, "items").unwrap().len(), 7);

    let removed: Vec<usize> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            ModelEvent::RowsRemoved { first, .. } => Some(*first),
            _ => None,
        })
        .collect();
    assert_eq!(removed, vec![7, 5, 2]);
}

#[test]
fn remove_skips_rows_that_fail() {
    let catalog = items_catalog(3);
    let mut model = items_model(&catalog);
    // row 9 does not exist, so only rows 0 and 2 go
    let selection = Arc::new(RowSelection::with_rows([0, 2, 9]));
    model.set_selection_model(Some(selection.clone()));

    assert_eq!(model.remove_selected(), 2);
    assert_eq!(selection.selected_rows(), vec![7]);
    assert_eq!(labels(&model), vec![json!("item-1")]);
}

#[test]
fn remove_single_row_shifts_selection() {
    let catalog = items_catalog(6);
    let mut model = items_model(&catalog);
    let selection = Arc::new(RowSelection::with_rows([0, 4]));
    model.set_selection_model(Some(selection.clone()));

    assert_eq!(model.remove(2).unwrap(), Removal::Deleted);
    assert_eq!(selection.selected_rows(), vec![0, 3]);
    assert_eq!(model.data(3, CHECK_STATE_ROLE), json!(true));
    assert_eq!(model.data(3, model.role_for_name("label").unwrap()), json!("item-4"));
}

#[test]
fn pending_rows_can_be_removed() {
    let catalog = items_catalog(2);
    let mut model = items_model(&catalog);
    let row = model.add().unwrap();
    assert_eq!(model.remove(row).unwrap(), Removal::Deleted);
    assert_eq!(model.row_count(), 2);
}

#[test]
fn soft_delete_then_recover_selected() {
    let (catalog, mut model) = books_model();
    let selection: Arc<dyn SelectionModel> = Arc::new(RowSelection::new());
    model.set_selection_model(Some(selection.clone()));
    let deleted_at = model.role_for_name("deleted_at").unwrap();

    model.set_data(1, CHECK_STATE_ROLE, json!(true)).unwrap();
    model.set_data(3, CHECK_STATE_ROLE, json!(true)).unwrap();
    assert_eq!(model.remove_selected(), 2);

    // books keeps soft-deleted rows
    assert_eq!(model.row_count(), BOOKS_SEED.len());
    assert!(model.data(1, deleted_at).is_string());
    assert!(model.data(3, deleted_at).is_string());
    assert!(model.data(0, deleted_at).is_null());
    assert_eq!(model.selected_rows(), 0);

    selection.select(1);
    selection.select(3);
    assert_eq!(model.recover_selected(), 2);
    assert_eq!(model.selected_rows(), 0);
    for row in 0..model.row_count() {
        assert!(model.data(row, deleted_at).is_null());
    }
    let stored = catalog.rows(":memory:", "books").unwrap();
    assert!(stored.iter().all(|r| r[6].is_null()));
}

#[test]
fn recover_row_out_of_range() {
    let (_, mut model) = books_model();
    assert!(matches!(
        model.recover_row(BOOKS_SEED.len()),
        Err(TableError::RowOutOfRange { .. })
    ));
}

#[test]
fn no_tracker_means_nothing_selected() {
    let (_, mut model) = books_model();
    assert!(model.selection_model().is_none());
    assert_eq!(model.selected_rows(), 0);
    assert_eq!(model.remove_selected(), 0);
    assert_eq!(model.recover_selected(), 0);
    assert_eq!(model.row_count(), BOOKS_SEED.len());
}

#[test]
fn rebinding_drops_the_selection() {
    let (catalog, mut model) = books_model();
    catalog
        .create_table(":memory:", TableSchema::new("tags").column(ColumnSchema::new("label")))
        .unwrap();
    for tag in ["a", "b", "c"] {
        catalog
            .insert_row(":memory:", "tags", &[("label", json!(tag))])
            .unwrap();
    }
    model.set_selection_model(Some(Arc::new(RowSelection::new())));
    model.set_data(1, CHECK_STATE_ROLE, json!(true)).unwrap();
    let events = record_events(&mut model);

    model.set_table("tags");

    assert_eq!(model.selected_rows(), 0);
    assert_eq!(model.data(1, CHECK_STATE_ROLE), json!(false));
    assert_eq!(model.remove_selected(), 0);
    assert_eq!(labels(&model), vec![json!("a"), json!("b"), json!("c")]);
    assert!(events
        .lock()
        .unwrap()
        .contains(&ModelEvent::SelectedRowsChanged));
}

#[test]
fn refresh_drops_the_selection() {
    let (_, mut model) = books_model();
    model.set_selection_model(Some(Arc::new(RowSelection::new())));
    let row = model.insert(0).unwrap();
    model.set_data(row, CHECK_STATE_ROLE, json!(true)).unwrap();
    assert_eq!(model.selected_rows(), 1);

    // the pending row is fetched back at the end
    model.refresh().unwrap();

    assert_eq!(model.selected_rows(), 0);
    assert_eq!(model.remove_selected(), 0);
    assert_eq!(model.row_count(), BOOKS_SEED.len() + 1);
}
