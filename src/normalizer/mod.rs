use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;

use crate::app::{RelayError, Result};
use crate::domain::Item;

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a feed document into items, in the order the source lists them.
    ///
    /// A malformed document fails the whole call. An entry without a usable
    /// publication date is dropped on its own and logged.
    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<Vec<Item>> {
        let feed = parser::parse(body).map_err(|e| RelayError::FeedParse(e.to_string()))?;

        let items = feed
            .entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match Self::to_item(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(address = feed_url, index, error = %e, "Skipping feed item");
                    None
                }
            })
            .collect();

        Ok(items)
    }

    fn to_item(entry: Entry) -> Result<Item> {
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                let id = if entry.id.is_empty() { "(no id)" } else { entry.id.as_str() };
                RelayError::ItemParse(format!("missing or unparsable date on entry {}", id))
            })?;

        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Ok(Item {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            description,
            link: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            published_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
      <description>&lt;p&gt;This is item 2&lt;/p&gt;</description>
    </item>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
  </channel>
</rss>"#;

    const RSS_MISSING_DATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>Undated</title>
      <link>https://example.com/undated</link>
      <description>No date here</description>
    </item>
    <item>
      <title>Dated</title>
      <link>https://example.com/dated</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_keeps_source_order() {
        let items = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Test Item 2");
        assert_eq!(items[0].link, "https://example.com/item2");
        assert_eq!(
            items[0].published_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(items[1].title, "Test Item 1");
        assert_eq!(items[1].description, "This is item 1");
    }

    #[test]
    fn test_description_markup_is_preserved_for_the_notifier() {
        let items = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();
        assert!(items[0].description.contains("This is item 2"));
    }

    #[test]
    fn test_item_without_date_is_skipped() {
        let items = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_MISSING_DATE.as_bytes())
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Dated");
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn test_item_with_unparsable_date_is_skipped() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>bad</title>
      <link>https://example.com/bad</link>
      <pubDate>not a date</pubDate>
    </item>
    <item>
      <title>good</title>
      <link>https://example.com/good</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

        let items = Normalizer::new()
            .normalize("https://example.com/feed.xml", body.as_bytes())
            .unwrap();

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["good"]);
    }

    #[test]
    fn test_malformed_document_fails() {
        let err = Normalizer::new()
            .normalize("https://example.com/feed.xml", b"<html><body>not a feed")
            .unwrap_err();
        assert!(matches!(err, RelayError::FeedParse(_)));
    }

    #[test]
    fn test_empty_channel() {
        let body = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let items = Normalizer::new()
            .normalize("https://example.com/feed.xml", body.as_bytes())
            .unwrap();
        assert!(items.is_empty());
    }
}
