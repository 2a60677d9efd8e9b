//! Selection - which rows of a view are checked.
//!
//! The tracker is owned by the view, not by the model. A
//! [`TableModel`](crate::TableModel) only holds a shared handle and works
//! fine without one.

mod in_memory;

pub use in_memory::RowSelection;

/// Row-level selection state shared between a view and its model.
pub trait SelectionModel: Send + Sync {
    fn is_selected(&self, row: usize) -> bool;

    fn select(&self, row: usize);

    fn deselect(&self, row: usize);

    /// Selected rows in ascending order.
    fn selected_rows(&self) -> Vec<usize>;

    fn clear(&self);

    /// `row` left the model: drop it and shift every higher row down by one.
    fn rows_removed(&self, row: usize);

    /// A row was inserted at `row`: shift it and every higher row up by one.
    fn rows_inserted(&self, row: usize);

    fn selected_count(&self) -> usize {
        self.selected_rows().len()
    }

    fn set_selected(&self, row: usize, selected: bool) {
        if selected {
            self.select(row);
        } else {
            self.deselect(row);
        }
    }
}
