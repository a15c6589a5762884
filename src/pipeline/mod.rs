pub mod persistence;
pub mod project;
mod region_state;
mod store;

#[cfg(test)]
pub mod test_fixture;

pub use project::ProjectState;
pub use region_state::{SourceId, SourceRegionState};
pub use store::{NormalizedPositions, RegionError, RegionEvent, RegionStore};
