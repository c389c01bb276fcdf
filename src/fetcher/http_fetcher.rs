use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::fetcher::Fetcher;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("rss-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;

        let body = response.bytes().await?.to_vec();
        tracing::debug!(url, bytes = body.len(), "Fetched feed");

        Ok(body)
    }
}
