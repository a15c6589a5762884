// What survives a restart: every source's region, which one was selected,
// and the id counter so restored ids are never handed out again.

use serde::{Deserialize, Serialize};

use super::region_state::{SourceId, SourceRegionState};
use super::store::RegionStore;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectState {
    pub sources: Vec<SourceRegionState>,
    pub active: Option<SourceId>,
    pub next_id: u64,
}

impl ProjectState {
    pub fn capture(store: &RegionStore) -> Self {
        Self {
            sources: store.records().cloned().collect(),
            active: store.active(),
            next_id: store.next_id(),
        }
    }

    /// Loads every saved source into `store`. The caller still has to
    /// reassign audio before any of them become playable.
    pub fn restore_into(self, store: &mut RegionStore) -> Vec<SourceId> {
        let mut restored = Vec::with_capacity(self.sources.len());
        for saved in self.sources {
            restored.push(store.restore(saved));
        }
        store.reserve_ids(self.next_id);
        restored
    }
}
