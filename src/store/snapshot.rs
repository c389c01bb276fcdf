use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::app::{RelayError, Result};
use crate::domain::Feed;
use crate::store::Persistence;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    feeds: Vec<Feed>,
}

/// JSON snapshot on disk, replaced atomically on every save.
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> RelayError {
        RelayError::CorruptStore {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn read_contents(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Persistence for JsonSnapshot {
    fn load(&self) -> Result<Vec<Feed>> {
        let Some(content) = self.read_contents()? else {
            tracing::info!(path = %self.path.display(), "No feed store found, creating an empty one");
            self.save(&[])?;
            return Ok(Vec::new());
        };

        let snapshot: SnapshotFile =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        let mut seen = HashSet::new();
        for feed in &snapshot.feeds {
            if !seen.insert(feed.identifier.as_str()) {
                return Err(self.corrupt(format!("duplicate identifier {}", feed.identifier)));
            }
        }

        tracing::debug!(path = %self.path.display(), feeds = snapshot.feeds.len(), "Loaded feed store");
        Ok(snapshot.feeds)
    }

    fn save(&self, feeds: &[Feed]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(&SnapshotFile {
            feeds: feeds.to_vec(),
        })
        .map_err(|e| RelayError::Other(format!("Failed to serialize feeds: {}", e)))?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

/// Keeps the last saved registry in memory.
#[derive(Default)]
pub struct MemorySnapshot {
    feeds: Mutex<Option<Vec<Feed>>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry as last saved, or `None` if nothing was ever saved.
    pub fn saved(&self) -> Option<Vec<Feed>> {
        self.feeds.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Persistence for MemorySnapshot {
    fn load(&self) -> Result<Vec<Feed>> {
        let mut guard = self
            .feeds
            .lock()
            .map_err(|e| RelayError::Other(e.to_string()))?;
        Ok(guard.get_or_insert_with(Vec::new).clone())
    }

    fn save(&self, feeds: &[Feed]) -> Result<()> {
        let mut guard = self
            .feeds
            .lock()
            .map_err(|e| RelayError::Other(e.to_string()))?;
        *guard = Some(feeds.to_vec());
        Ok(())
    }
}
