use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::app::{RelayError, Result};
use crate::domain::Feed;
use crate::store::{MemorySnapshot, Persistence};

/// The registry of watched feeds.
///
/// A single mutex guards reads, writes and saves. Saves run with the guard
/// held, so concurrent flushes from the command path and the poll loop cannot
/// interleave or write an older registry over a newer one.
pub struct FeedStore {
    feeds: Mutex<Vec<Feed>>,
    persistence: Arc<dyn Persistence + Send + Sync>,
}

impl FeedStore {
    /// Load the registry through `persistence`.
    pub fn open(persistence: Arc<dyn Persistence + Send + Sync>) -> Result<Self> {
        let feeds = persistence.load()?;
        Ok(Self {
            feeds: Mutex::new(feeds),
            persistence,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(Arc::new(MemorySnapshot::new()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Feed>>> {
        self.feeds
            .lock()
            .map_err(|e| RelayError::Other(format!("Feed store lock poisoned: {}", e)))
    }

    /// Insert `feed` and persist. Duplicate identifiers are rejected.
    ///
    /// If the save fails the insert is rolled back.
    pub fn add(&self, feed: Feed) -> Result<()> {
        let mut feeds = self.lock()?;

        if feeds.iter().any(|f| f.identifier == feed.identifier) {
            return Err(RelayError::DuplicateFeed(feed.identifier));
        }

        feeds.push(feed);
        if let Err(e) = self.persistence.save(&feeds) {
            feeds.pop();
            return Err(e);
        }

        Ok(())
    }

    /// Remove the feed named `identifier` and persist.
    ///
    /// If the save fails the feed is restored at its previous position.
    pub fn remove(&self, identifier: &str) -> Result<Feed> {
        let mut feeds = self.lock()?;

        let index = feeds
            .iter()
            .position(|f| f.identifier == identifier)
            .ok_or_else(|| RelayError::FeedNotFound(identifier.to_string()))?;

        let removed = feeds.remove(index);
        if let Err(e) = self.persistence.save(&feeds) {
            feeds.insert(index, removed);
            return Err(e);
        }

        Ok(removed)
    }

    pub fn list(&self) -> Result<Vec<Feed>> {
        Ok(self.lock()?.clone())
    }

    pub fn get(&self, identifier: &str) -> Result<Option<Feed>> {
        Ok(self
            .lock()?
            .iter()
            .find(|f| f.identifier == identifier)
            .cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Move the watermark forward. Never moves it back.
    ///
    /// Returns `true` if the stored value changed. A feed removed in the
    /// meantime is not an error; it just reports no change.
    pub fn advance_watermark(&self, identifier: &str, timestamp: DateTime<Utc>) -> Result<bool> {
        let mut feeds = self.lock()?;

        match feeds.iter_mut().find(|f| f.identifier == identifier) {
            Some(feed) if timestamp > feed.watermark => {
                feed.watermark = timestamp;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Persist the current registry.
    pub fn flush(&self) -> Result<()> {
        let feeds = self.lock()?;
        self.persistence.save(&feeds)
    }
}
