use serde::{Deserialize, Serialize};

/// Notifications published by a [`TableModel`](crate::TableModel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelEvent {
    DatabaseNameChanged,
    TableChanged,
    SelectedRowsChanged,
    Error(String),
    /// Cells of `row` changed for the listed roles.
    DataChanged { row: usize, roles: Vec<i32> },
    /// Rows and columns must be re-read from scratch.
    ModelReset,
    RowsInserted { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
}

/// Handle returned by [`EventEmitter::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&ModelEvent) + Send + Sync>;

/// Synchronous observer list.
///
/// `emit` calls every listener immediately, in registration order, before
/// returning. Nothing is queued or coalesced.
pub struct EventEmitter {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl EventEmitter {
    pub fn new() -> Self {
        EventEmitter {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &ModelEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
