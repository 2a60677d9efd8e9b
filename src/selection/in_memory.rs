use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::SelectionModel;

/// Set of selected rows behind an `RwLock`, meant to be shared via `Arc`.
#[derive(Debug, Default)]
pub struct RowSelection {
    rows: RwLock<BTreeSet<usize>>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = usize>) -> Self {
        RowSelection {
            rows: RwLock::new(rows.into_iter().collect()),
        }
    }

    // A panic in another holder cannot leave a BTreeSet half-updated in a
    // way that matters here, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, BTreeSet<usize>> {
        self.rows.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeSet<usize>> {
        self.rows.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl SelectionModel for RowSelection {
    fn is_selected(&self, row: usize) -> bool {
        self.read().contains(&row)
    }

    fn select(&self, row: usize) {
        self.write().insert(row);
    }

    fn deselect(&self, row: usize) {
        self.write().remove(&row);
    }

    fn selected_rows(&self) -> Vec<usize> {
        self.read().iter().copied().collect()
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn rows_removed(&self, row: usize) {
        let mut rows = self.write();
        let shifted: BTreeSet<usize> = rows
            .iter()
            .filter(|&&r| r != row)
            .map(|&r| if r > row { r - 1 } else { r })
            .collect();
        *rows = shifted;
    }

    fn rows_inserted(&self, row: usize) {
        let mut rows = self.write();
        let shifted: BTreeSet<usize> = rows
            .iter()
            .map(|&r| if r >= row { r + 1 } else { r })
            .collect();
        *rows = shifted;
    }

    fn selected_count(&self) -> usize {
        self.read().len()
    }
}
