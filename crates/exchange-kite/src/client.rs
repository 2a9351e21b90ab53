//! Kite Connect REST client: authentication headers, request pacing and
//! envelope decoding.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use intraday_core::config::KiteConfig;

use crate::error::KiteError;
use crate::types;

/// Kite allows 3 historical requests per second.
const HISTORY_PER_SECOND: NonZeroU32 = match NonZeroU32::new(3) {
    Some(n) => n,
    None => panic!("rate must be non-zero"),
};

/// Quote, order and portfolio endpoints allow 10 per second.
const GENERAL_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("rate must be non-zero"),
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Which rate bucket a request draws from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Bucket {
    General,
    History,
}

/// Kite Connect v3 REST client.
pub struct KiteClient {
    base_url: String,
    api_key: String,
    access_token: String,
    http: Client,
    general: Limiter,
    history: Limiter,
    /// `EXCHANGE:SYMBOL` to instrument token, filled from LTP responses.
    pub(crate) tokens: RwLock<HashMap<String, u64>>,
}

impl std::fmt::Debug for KiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl KiteClient {
    /// Builds a client from the `[kite]` configuration.
    ///
    /// # Errors
    /// Returns error if credentials are missing or the HTTP client cannot be built.
    pub fn new(config: &KiteConfig) -> Result<Self, KiteError> {
        if config.api_key.is_empty() || config.access_token.is_empty() {
            return Err(KiteError::Configuration(
                "kite.api_key and kite.access_token are required".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| KiteError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            http,
            general: Arc::new(RateLimiter::direct(Quota::per_second(GENERAL_PER_SECOND))),
            history: Arc::new(RateLimiter::direct(Quota::per_second(HISTORY_PER_SECOND))),
            tokens: RwLock::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(&self) -> String {
        format!("token {}:{}", self.api_key, self.access_token)
    }

    async fn wait(&self, bucket: Bucket) {
        match bucket {
            Bucket::General => self.general.until_ready().await,
            Bucket::History => self.history.until_ready().await,
        }
    }

    /// Rate-limited, authenticated GET.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        bucket: Bucket,
    ) -> Result<T, KiteError> {
        self.wait(bucket).await;

        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("X-Kite-Version", "3")
            .header("Authorization", self.authorization())
            .query(query)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Rate-limited, authenticated form POST.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, KiteError> {
        self.wait(Bucket::General).await;

        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("X-Kite-Version", "3")
            .header("Authorization", self.authorization())
            .form(form)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, KiteError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        types::decode(status, &body)
    }
}
