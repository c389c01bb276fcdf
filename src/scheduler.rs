//! The poll loop: fetch every feed, forward what is new, advance watermarks.
//!
//! Delivery is at-least-once. A watermark only moves after at least one item
//! was delivered, so a feed whose deliveries all failed is retried with the
//! same watermark next cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, Result};
use crate::detector::detect;
use crate::domain::Feed;
use crate::fetcher::ParallelFetcher;
use crate::normalizer::Normalizer;
use crate::notifier::Notifier;
use crate::store::FeedStore;

/// Counters for one pass over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds: usize,
    pub failed_feeds: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub watermarks_advanced: usize,
    pub persisted: bool,
}

#[derive(Debug, Default)]
struct FeedOutcome {
    delivered: usize,
    failed_deliveries: usize,
    advanced: bool,
}

pub struct Poller {
    store: Arc<FeedStore>,
    fetcher: ParallelFetcher,
    normalizer: Normalizer,
    notifier: Arc<dyn Notifier + Send + Sync>,
    delay: Duration,
}

impl Poller {
    pub fn new(ctx: &AppContext, delay: Duration) -> Self {
        Self::with_parts(
            ctx.store.clone(),
            ctx.parallel_fetcher.clone(),
            ctx.normalizer.clone(),
            ctx.notifier.clone(),
            delay,
        )
    }

    pub fn with_parts(
        store: Arc<FeedStore>,
        fetcher: ParallelFetcher,
        normalizer: Normalizer,
        notifier: Arc<dyn Notifier + Send + Sync>,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer,
            notifier,
            delay,
        }
    }

    /// Run cycles until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(delay_secs = self.delay.as_secs(), "Poller started");

        loop {
            self.run_cycle(&cancel).await;

            if cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        tracing::info!("Poller stopped");
    }

    /// One pass over every feed in the registry.
    ///
    /// Per-feed failures are logged and counted, never propagated. If `cancel`
    /// fires mid-cycle the feed in progress completes and the rest are left
    /// for the next run.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let start = Utc::now();
        let mut report = CycleReport::default();

        let feeds = match self.store.list() {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read feed registry");
                return report;
            }
        };

        if feeds.is_empty() {
            tracing::debug!("No feeds to poll");
            return report;
        }

        report.feeds = feeds.len();
        let results = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Cycle interrupted by shutdown while fetching");
                return report;
            }
            results = self.fetcher.fetch_all(feeds) => results,
        };

        for (feed, body) in results {
            if cancel.is_cancelled() {
                tracing::info!("Cycle interrupted by shutdown");
                break;
            }

            match self.process_feed(&feed, body).await {
                Ok(outcome) => {
                    report.delivered += outcome.delivered;
                    report.failed_deliveries += outcome.failed_deliveries;
                    if outcome.advanced {
                        report.watermarks_advanced += 1;
                    }
                }
                Err(e) => {
                    report.failed_feeds += 1;
                    tracing::warn!(
                        feed = %feed.identifier,
                        address = %feed.address,
                        error = %e,
                        retry = e.is_transient(),
                        "Failed to poll feed"
                    );
                }
            }
        }

        if report.watermarks_advanced > 0 {
            let store = self.store.clone();
            match tokio::task::spawn_blocking(move || store.flush()).await {
                Ok(Ok(())) => report.persisted = true,
                Ok(Err(e)) => tracing::error!(error = %e, "Failed to persist feed registry"),
                Err(e) => tracing::error!(error = %e, "Persist task failed"),
            }
        }

        let elapsed = Utc::now().signed_duration_since(start);
        tracing::info!(
            feeds = report.feeds,
            delivered = report.delivered,
            errors = report.failed_feeds,
            "Poll cycle complete ({:.1}s)",
            elapsed.num_milliseconds() as f64 / 1000.0
        );

        report
    }

    async fn process_feed(&self, feed: &Feed, body: Result<Vec<u8>>) -> Result<FeedOutcome> {
        let items = self.normalizer.normalize(&feed.address, &body?)?;

        // The registry may have changed while we were fetching
        let Some(current) = self.store.get(&feed.identifier)? else {
            tracing::debug!(feed = %feed.identifier, "Feed removed during fetch, skipping");
            return Ok(FeedOutcome::default());
        };

        let detection = detect(current.watermark, &items);
        if detection.is_empty() {
            tracing::debug!(feed = %feed.identifier, "No new items");
            return Ok(FeedOutcome::default());
        }

        let mut outcome = FeedOutcome::default();
        for item in &detection.new_items {
            match self.notifier.deliver(item).await {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.failed_deliveries += 1;
                    tracing::warn!(
                        feed = %feed.identifier,
                        item = item.display_title(),
                        link = %item.link,
                        error = %e,
                        "Failed to deliver item"
                    );
                }
            }
        }

        if outcome.delivered > 0 {
            outcome.advanced = self
                .store
                .advance_watermark(&feed.identifier, detection.watermark)?;
            tracing::info!(
                feed = %feed.identifier,
                delivered = outcome.delivered,
                watermark = %detection.watermark,
                "Forwarded new items"
            );
        }

        Ok(outcome)
    }
}
