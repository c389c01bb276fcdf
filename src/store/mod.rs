pub mod feed_store;
pub mod snapshot;

use crate::app::Result;
use crate::domain::Feed;

pub use feed_store::FeedStore;
pub use snapshot::{JsonSnapshot, MemorySnapshot};

/// Durable storage for the whole feed registry.
///
/// Implementations replace the stored registry as a unit; there is no
/// incremental update path.
pub trait Persistence {
    fn load(&self) -> Result<Vec<Feed>>;
    fn save(&self, feeds: &[Feed]) -> Result<()>;
}
