//! Watermark-based new-item detection.

use chrono::{DateTime, Utc};

use crate::domain::Item;

/// Outcome of comparing a fetched item list against a feed's watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Items published after the watermark, in fetch order.
    pub new_items: Vec<Item>,
    /// Latest publication time among `new_items`, or the input watermark.
    pub watermark: DateTime<Utc>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
    }
}

pub fn detect(watermark: DateTime<Utc>, items: &[Item]) -> Detection {
    let new_items: Vec<Item> = items
        .iter()
        .filter(|item| item.published_at > watermark)
        .cloned()
        .collect();

    let watermark = new_items
        .iter()
        .map(|item| item.published_at)
        .max()
        .unwrap_or(watermark);

    Detection {
        new_items,
        watermark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn item(title: &str, offset_secs: i64) -> Item {
        Item::new(title, base() + Duration::seconds(offset_secs))
    }

    #[test]
    fn test_only_items_after_watermark() {
        let items = vec![item("old", -60), item("new", 60)];
        let detection = detect(base(), &items);

        assert_eq!(detection.new_items, vec![item("new", 60)]);
        assert_eq!(detection.watermark, base() + Duration::seconds(60));
    }

    #[test]
    fn test_item_at_watermark_is_not_new() {
        let detection = detect(base(), &[item("same", 0)]);
        assert!(detection.is_empty());
        assert_eq!(detection.watermark, base());
    }

    #[test]
    fn test_empty_input_keeps_watermark() {
        let detection = detect(base(), &[]);
        assert!(detection.is_empty());
        assert_eq!(detection.watermark, base());
    }

    #[test]
    fn test_source_order_preserved_and_max_taken() {
        // Newest first, as most feeds list them
        let items = vec![item("c", 300), item("a", 100), item("old", -5), item("b", 200)];
        let detection = detect(base(), &items);

        let titles: Vec<&str> = detection.new_items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
        assert_eq!(detection.watermark, base() + Duration::seconds(300));
    }

    #[test]
    fn test_equal_timestamps_all_included() {
        let items = vec![item("first", 30), item("second", 30), item("third", 30)];
        let detection = detect(base(), &items);

        assert_eq!(detection.new_items.len(), 3);
        assert_eq!(detection.watermark, base() + Duration::seconds(30));
    }

    #[test]
    fn test_detect_is_repeatable() {
        let items = vec![item("x", 10), item("y", -10), item("z", 20)];
        let first = detect(base(), &items);
        let second = detect(base(), &items);
        assert_eq!(first, second);
    }

    #[test]
    fn test_matches_filter_definition_for_many_watermarks() {
        let items: Vec<Item> = (-5..=5).map(|i| item(&format!("i{}", i), i * 7)).collect();

        for w in -50..=50 {
            let watermark = base() + Duration::seconds(w);
            let detection = detect(watermark, &items);

            let expected: Vec<Item> = items
                .iter()
                .filter(|i| i.published_at > watermark)
                .cloned()
                .collect();
            assert_eq!(detection.new_items, expected);

            let expected_mark = expected
                .iter()
                .map(|i| i.published_at)
                .max()
                .unwrap_or(watermark);
            assert_eq!(detection.watermark, expected_mark);
            assert!(detection.watermark >= watermark);
        }
    }
}
