use crate::client::core::ScanClient;
use crate::config::BridgeConfig;
use crate::Result;
use std::time::Duration;

/// Builder for creating base clients with custom configuration.
///
/// Starts from [`BridgeConfig::default`] (or a supplied config); individual
/// setters override single fields.
pub struct ScanClientBuilder {
    config: BridgeConfig,
}

impl ScanClientBuilder {
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Override the API base URL (primarily for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Build the client. Fails with a configuration error when the key or
    /// URL is unusable.
    pub fn build(self) -> Result<ScanClient> {
        ScanClient::new(&self.config)
    }
}

impl Default for ScanClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
