#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use rss_relay::app::{RelayError, Result};
use rss_relay::domain::{Feed, Item};
use rss_relay::fetcher::{Fetcher, ParallelFetcher};
use rss_relay::normalizer::Normalizer;
use rss_relay::notifier::Notifier;
use rss_relay::scheduler::Poller;
use rss_relay::store::{FeedStore, MemorySnapshot, Persistence};

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

pub fn feed(identifier: &str, address: &str, watermark: DateTime<Utc>) -> Feed {
    let mut feed = Feed::named(identifier.into(), address.into());
    feed.watermark = watermark;
    feed
}

/// An RSS 2.0 document with one item per `(title, published)` pair.
pub fn rss(items: &[(&str, DateTime<Utc>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title>"#,
    );
    for (title, published) in items {
        xml.push_str(&format!(
            "<item><title>{t}</title><link>https://example.com/{t}</link>\
             <description>&lt;p&gt;{t} body&lt;/p&gt;</description>\
             <pubDate>{d}</pubDate></item>",
            t = title,
            d = published.to_rfc2822()
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

enum Response {
    Body(String),
    Fail(String),
}

/// Serves canned documents by URL.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Response>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn serve(&self, url: &str, body: String) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::Body(body));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::Fail(reason.to_string()));
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.lock().unwrap().get(url) {
            Some(Response::Body(body)) => Ok(body.clone().into_bytes()),
            Some(Response::Fail(reason)) => Err(RelayError::Transport(reason.clone())),
            None => Err(RelayError::Transport(format!("no route to {}", url))),
        }
    }
}

/// Records delivered items; fails for titles listed in `fail_titles`.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Item>>,
    fail_titles: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn fail_on(&self, title: &str) {
        self.fail_titles.lock().unwrap().push(title.to_string());
    }

    pub fn recover(&self) {
        self.fail_titles.lock().unwrap().clear();
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|i| i.title.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, item: &Item) -> Result<()> {
        if self.fail_titles.lock().unwrap().contains(&item.title) {
            return Err(RelayError::Transport("channel unavailable".into()));
        }
        self.sent.lock().unwrap().push(item.clone());
        Ok(())
    }
}

/// Memory-backed persistence that counts saves.
#[derive(Default)]
pub struct CountingSnapshot {
    inner: MemorySnapshot,
    saves: AtomicUsize,
}

impl CountingSnapshot {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<Feed> {
        self.inner.saved().unwrap_or_default()
    }
}

impl Persistence for CountingSnapshot {
    fn load(&self) -> Result<Vec<Feed>> {
        self.inner.load()
    }

    fn save(&self, feeds: &[Feed]) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(feeds)
    }
}

pub struct Harness {
    pub store: Arc<FeedStore>,
    pub snapshot: Arc<CountingSnapshot>,
    pub fetcher: Arc<StubFetcher>,
    pub notifier: Arc<RecordingNotifier>,
    pub poller: Poller,
}

impl Harness {
    pub fn new(fetcher: StubFetcher) -> Self {
        let snapshot = Arc::new(CountingSnapshot::default());
        let store = Arc::new(FeedStore::open(snapshot.clone()).unwrap());
        let fetcher = Arc::new(fetcher);
        let notifier = Arc::new(RecordingNotifier::default());

        let poller = Poller::with_parts(
            store.clone(),
            ParallelFetcher::with_workers(fetcher.clone(), 4),
            Normalizer::new(),
            notifier.clone(),
            Duration::from_secs(3600),
        );

        Self {
            store,
            snapshot,
            fetcher,
            notifier,
            poller,
        }
    }

    /// Add a feed and reset the save counter so tests only see poll saves.
    pub fn watch(&self, feed: Feed) {
        self.store.add(feed).unwrap();
        self.snapshot.saves.store(0, Ordering::SeqCst);
    }

    pub fn watermark(&self, identifier: &str) -> DateTime<Utc> {
        self.store.get(identifier).unwrap().unwrap().watermark
    }
}
