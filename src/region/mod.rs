// Keeping the on-screen handles, the stored region and the live playhead in agreement.
pub mod driver;
pub mod envelope;
pub mod handle;
pub mod mapper;
pub mod sync;

pub use driver::{PlaybackDriver, TickOutcome};
pub use envelope::FadeEnvelope;
pub use handle::{DragMode, HandleConfig, HandleController, Lane, PositionsChanged, Side, linked_pair};
pub use sync::RegionSync;
