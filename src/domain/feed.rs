use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A watched feed and the publication time of the newest item already delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub identifier: String,
    pub address: String,
    #[serde(rename = "lastUpdated")]
    pub watermark: DateTime<Utc>,
}

impl Feed {
    /// Create a feed with a generated identifier.
    pub fn new(address: String) -> Self {
        Self::named(Uuid::new_v4().to_string(), address)
    }

    /// Create a feed with an operator-chosen identifier.
    pub fn named(identifier: String, address: String) -> Self {
        Self {
            identifier,
            address,
            watermark: Utc::now(),
        }
    }
}
