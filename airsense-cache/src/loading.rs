//! Per-id busy flags for lookups in flight.

use airsense_core::EntityId;
use std::collections::BTreeSet;
use tokio::sync::watch;

/// Tracks which ids currently have a lookup in flight.
///
/// Readers can poll [`LoadingTracker::is_loading`] on every frame or
/// [`subscribe`](LoadingTracker::subscribe) to be woken on each change.
#[derive(Debug)]
pub struct LoadingTracker {
    busy: watch::Sender<BTreeSet<EntityId>>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (busy, _) = watch::channel(BTreeSet::new());
        Self { busy }
    }

    pub(crate) fn begin(&self, id: EntityId) {
        self.busy.send_modify(|ids| {
            ids.insert(id);
        });
    }

    pub(crate) fn finish(&self, id: EntityId) {
        self.busy.send_modify(|ids| {
            ids.remove(&id);
        });
    }

    pub fn is_loading(&self, id: EntityId) -> bool {
        self.busy.borrow().contains(&id)
    }

    /// Ids with a lookup in flight, ascending.
    pub fn busy_ids(&self) -> Vec<EntityId> {
        self.busy.borrow().iter().copied().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<EntityId>> {
        self.busy.subscribe()
    }
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}
