use std::collections::{HashSet, VecDeque};

use crate::storage::traits::SeenStore;

/// Bounded, insertion-ordered set of identifiers that have already been processed
pub struct StateTracker {
    store: Box<dyn SeenStore>,
    order: VecDeque<String>,
    seen: HashSet<String>,
    max_entries: usize,
}

impl StateTracker {
    pub fn new(store: Box<dyn SeenStore>, max_entries: usize) -> Self {
        Self {
            store,
            order: VecDeque::new(),
            seen: HashSet::new(),
            max_entries,
        }
    }

    /// Replace in-memory state with the persisted identifiers.
    /// A store error leaves the tracker empty and is only logged.
    pub fn load(&mut self) {
        self.order.clear();
        self.seen.clear();

        match self.store.load() {
            Ok(ids) => {
                for id in ids {
                    self.insert(id);
                }
                tracing::info!(entries = self.order.len(), "Loaded seen-item state");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load seen-item state, starting empty");
            }
        }
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record `id`; a repeated id keeps its first position
    pub fn mark_seen(&mut self, id: &str) {
        if !self.seen.contains(id) {
            self.insert(id.to_string());
        }
    }

    /// Drop the oldest entries beyond the cap, then persist. Store errors are only logged.
    pub fn save(&mut self) {
        while self.order.len() > self.max_entries {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        let ids: Vec<String> = self.order.iter().cloned().collect();
        match self.store.save(&ids) {
            Ok(()) => tracing::debug!(entries = ids.len(), "Saved seen-item state"),
            Err(e) => tracing::warn!(error = %e, "Failed to save seen-item state"),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, id: String) {
        if self.seen.insert(id.clone()) {
            self.order.push_back(id);
        }
    }
}
