//! Per-name load slots.
//!
//! Each name owns a slot moving `NotLoaded -> Loading -> Loaded | Failed`.
//! Exactly one caller runs the load for a name while the slot is `Loading`;
//! concurrent callers block on the slot's condvar and then share the result.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Snapshot of a name's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadState::NotLoaded => "not-loaded",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed => "failed",
        })
    }
}

enum Slot<T> {
    NotLoaded,
    Loading,
    Loaded(Arc<T>),
    Failed,
}

impl<T> Slot<T> {
    fn state(&self) -> LoadState {
        match self {
            Slot::NotLoaded => LoadState::NotLoaded,
            Slot::Loading => LoadState::Loading,
            Slot::Loaded(_) => LoadState::Loaded,
            Slot::Failed => LoadState::Failed,
        }
    }
}

struct Cell<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Cell<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::NotLoaded),
            ready: Condvar::new(),
        }
    }

    fn settle(&self, slot: Slot<T>) {
        *self.slot.lock() = slot;
        self.ready.notify_all();
    }
}

/// Marks the slot `Failed` unless the load completed, so a panicking load
/// never leaves waiters blocked.
struct LoadingGuard<'a, T> {
    cell: &'a Cell<T>,
    settled: bool,
}

impl<T> LoadingGuard<'_, T> {
    fn settle(mut self, slot: Slot<T>) {
        self.cell.settle(slot);
        self.settled = true;
    }
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.cell.settle(Slot::Failed);
        }
    }
}

/// Loader-scoped table of slots keyed by name.
pub(crate) struct SlotTable<T> {
    cells: Mutex<HashMap<String, Arc<Cell<T>>>>,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SlotTable<T> {
    fn cell(&self, name: &str) -> Arc<Cell<T>> {
        let mut cells = self.cells.lock();
        if let Some(cell) = cells.get(name) {
            return Arc::clone(cell);
        }
        let cell = Arc::new(Cell::new());
        cells.insert(name.to_string(), Arc::clone(&cell));
        cell
    }

    pub(crate) fn state(&self, name: &str) -> LoadState {
        let cell = self.cells.lock().get(name).cloned();
        cell.map_or(LoadState::NotLoaded, |c| c.slot.lock().state())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<T>> {
        let cell = self.cells.lock().get(name).cloned()?;
        let slot = cell.slot.lock();
        match &*slot {
            Slot::Loaded(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Return the loaded value for `name`, running `load` if no value exists
    /// yet and no other caller is loading it.
    ///
    /// A caller that waited on a load which then failed starts a new attempt
    /// rather than inheriting the other caller's error.
    pub(crate) fn load_once<E>(
        &self,
        name: &str,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let cell = self.cell(name);
        {
            let mut slot = cell.slot.lock();
            loop {
                match &*slot {
                    Slot::Loaded(value) => return Ok(Arc::clone(value)),
                    Slot::Loading => cell.ready.wait(&mut slot),
                    Slot::NotLoaded | Slot::Failed => break,
                }
            }
            *slot = Slot::Loading;
        }

        let guard = LoadingGuard {
            cell: &cell,
            settled: false,
        };
        match load() {
            Ok(value) => {
                let value = Arc::new(value);
                guard.settle(Slot::Loaded(Arc::clone(&value)));
                Ok(value)
            }
            Err(e) => {
                guard.settle(Slot::Failed);
                Err(e)
            }
        }
    }
}
