use crate::config::BridgeConfig;
use crate::error::ApiErrorBody;
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Header carrying the API key on every upstream call.
pub const AUTH_HEADER: &str = "x-pan-token";

/// Single-attempt JSON-over-HTTP transport for the scanning API.
///
/// No retries happen here; the base client's policy loop owns those.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .pool_max_idle_per_host(
                std::env::var("AIRS_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .user_agent(concat!("airs-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, Some(&body), &[]).await
    }

    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.execute(Method::GET, path, None, query).await
    }

    /// One attempt, bounded by the configured timeout. Exceeding it drops the
    /// in-flight request and yields `Error::Timeout`.
    async fn execute<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        query: &[(&str, String)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method, &url)
            .header(AUTH_HEADER, &self.api_key)
            .header("accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(b) = body {
            request = request.json(b);
        }

        let attempt = async {
            let response = request
                .send()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;
            let status = response.status();
            let retry_after_ms = retry_after_ms(response.headers());
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;

            if !status.is_success() {
                let raw = String::from_utf8_lossy(&bytes);
                let mut parsed = ApiErrorBody::parse(&raw);
                if status.as_u16() == 429 && parsed.retry_after.is_none() {
                    parsed.retry_after = retry_after_ms.map(|ms| ms as f64 / 1000.0);
                }
                return Err(Error::Api {
                    status: status.as_u16(),
                    body: parsed,
                });
            }

            Ok(serde_json::from_slice::<T>(&bytes)?)
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Best-effort parsing of `Retry-After`.
///
/// Only the `Retry-After: <seconds>` form is supported.
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get("retry-after")?.to_str().ok()?.trim();
    let secs: u64 = raw.parse().ok()?;
    Some(secs.saturating_mul(1000))
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
