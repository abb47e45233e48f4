use crate::sort::{sort_entries, SortKey};
use crate::types::RepositoryEntry;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Refresh-cycle stamp. Work started under an older generation may not
/// mutate shared state once a newer cycle has begun.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    generation: Generation,
    entries: Vec<RepositoryEntry>,
}

/// The shared, ordered list of fetched repositories together with the
/// generation counter that gates every mutation of it.
#[derive(Debug, Default)]
pub struct Catalog {
    state: Mutex<CatalogState>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new cycle: bumps the generation and empties the catalog.
    pub fn begin_cycle(&self) -> Generation {
        let mut state = self.state.lock();
        state.generation = state.generation.next();
        state.entries.clear();
        state.generation
    }

    pub fn generation(&self) -> Generation {
        self.state.lock().generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.state.lock().generation == generation
    }

    /// Appends `entry` if `generation` is still the live one. The check and
    /// the insert happen under the same lock.
    pub fn insert_if_current(&self, generation: Generation, entry: RepositoryEntry) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.entries.push(entry);
        true
    }

    /// Stable sort by `key`, with repositories absent from `seen` first.
    pub fn sort(&self, key: SortKey, descending: bool, seen: &BTreeSet<String>) {
        let mut state = self.state.lock();
        sort_entries(&mut state.entries, key, descending, seen);
    }

    /// Runs `f` over the entries while holding the catalog lock.
    pub fn read<R>(&self, f: impl FnOnce(&[RepositoryEntry]) -> R) -> R {
        let state = self.state.lock();
        f(&state.entries)
    }

    pub fn snapshot(&self) -> Vec<RepositoryEntry> {
        self.read(|entries| entries.to_vec())
    }

    pub fn len(&self) -> usize {
        self.read(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
