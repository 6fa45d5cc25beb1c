use crate::core::coin::{Coin, HistoryRecord, SnapshotAck};
use crate::core::market::{FetchFailure, MarketDataClient, Operation};
use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

/// Talks to the dashboard backend over HTTP. Failures are reported once and
/// never retried.
pub struct HttpMarketClient {
    base_url: Url,
    client: Client,
}

impl HttpMarketClient {
    /// `base_url` is the full API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot have paths appended: {base_url}");
        }
        let client = Client::builder()
            .user_agent(concat!("coindash/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        operation: Operation,
        method: Method,
        url: Url,
    ) -> Result<T, FetchFailure> {
        debug!(%method, %url, "Requesting backend");

        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport {
                operation,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status {
                operation,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::Transport {
                operation,
                message: e.to_string(),
            })?;
        serde_json::from_slice(&body).map_err(|source| FetchFailure::Decode { operation, source })
    }
}

#[async_trait]
impl MarketDataClient for HttpMarketClient {
    #[instrument(name = "ListCoins", skip(self))]
    async fn list_coins(&self) -> Result<Vec<Coin>, FetchFailure> {
        let url = self.endpoint(&["coins"]);
        self.request(Operation::ListCoins, Method::GET, url).await
    }

    #[instrument(name = "StoreHistory", skip(self))]
    async fn store_history_snapshot(&self) -> Result<SnapshotAck, FetchFailure> {
        let url = self.endpoint(&["history"]);
        self.request(Operation::StoreHistory, Method::POST, url).await
    }

    #[instrument(name = "FetchHistory", skip(self), fields(coin_id = %coin_id))]
    async fn fetch_history(&self, coin_id: &str) -> Result<Vec<HistoryRecord>, FetchFailure> {
        let url = self.endpoint(&["history", coin_id]);
        self.request(Operation::FetchHistory, Method::GET, url).await
    }
}
