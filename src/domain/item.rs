use chrono::{DateTime, Utc};

/// One syndication entry as fetched during a cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl Item {
    pub fn new(title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            link: String::new(),
            published_at,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
