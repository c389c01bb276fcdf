use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::app::{RelayError, Result};
use crate::domain::Feed;
use crate::fetcher::Fetcher;

pub const DEFAULT_WORKERS: usize = 10;

/// Fetches many feeds at once, at most `workers` in flight.
#[derive(Clone)]
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Fetch every feed. Results are returned in the order of `feeds`.
    ///
    /// Dropping the returned future aborts every fetch still in flight.
    pub async fn fetch_all(&self, feeds: Vec<Feed>) -> Vec<(Feed, Result<Vec<u8>>)> {
        let mut tasks = JoinSet::new();

        for (index, feed) in feeds.iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let url = feed.address.clone();

            tasks.spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => fetcher.fetch(&url).await,
                    Err(e) => Err(RelayError::Other(e.to_string())),
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<Vec<u8>>>> = feeds.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("Fetch task join error: {}", e),
            }
        }

        feeds
            .into_iter()
            .zip(slots)
            .map(|(feed, slot)| {
                let result = slot
                    .unwrap_or_else(|| Err(RelayError::Other("Fetch task failed".to_string())));
                (feed, result)
            })
            .collect()
    }
}
