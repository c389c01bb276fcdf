use std::sync::Arc;

use crate::app::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::notifier::{ChatNotifier, Notifier};
use crate::store::{FeedStore, JsonSnapshot};
use crate::telegram::TelegramClient;

/// Everything the poller and the command listener share, built once at startup.
pub struct AppContext {
    pub store: Arc<FeedStore>,
    pub parallel_fetcher: ParallelFetcher,
    pub normalizer: Normalizer,
    pub notifier: Arc<dyn Notifier + Send + Sync>,
    pub telegram: Arc<TelegramClient>,
}

impl AppContext {
    /// Build the context and load the feed registry.
    ///
    /// Fails on a corrupt snapshot; the caller treats that as fatal.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(FeedStore::open(Arc::new(JsonSnapshot::new(&config.data_file)))?);
        let telegram = Arc::new(TelegramClient::with_api_url(
            &config.api_url,
            &config.bot_token,
            config.send_timeout(),
        )?);

        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::with_timeout(config.fetch_timeout())?);
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher, config.workers);
        let notifier: Arc<dyn Notifier + Send + Sync> =
            Arc::new(ChatNotifier::new(telegram.clone(), config.chat_id.clone()));

        Ok(Self {
            store,
            parallel_fetcher,
            normalizer: Normalizer::new(),
            notifier,
            telegram,
        })
    }
}
