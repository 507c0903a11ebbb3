//! Enhanced client: rate gate, cache lookup, upstream call, cache store.
//!
//! Errors from the base client pass through untouched and are never cached.
//! Cache or limiter faults are logged and bypassed; they never fail a call.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheManager, CacheStats, OP_SCAN_RESULTS, OP_THREAT_REPORTS};
use crate::client::core::{ScanApi, ScanClient};
use crate::client::types::RequestOptions;
use crate::client::validation::{validate_async_batch, validate_ids, validate_scan_request};
use crate::config::BridgeConfig;
use crate::resilience::{RateLimitStatus, RateLimiter, RateLimiterStats};
use crate::types::{AsyncScanResponse, ScanIdResult, ScanRequest, ScanResponse, ThreatScanReport};
use crate::{Error, Result};

/// Rate-limit class shared by sync and async scans.
pub const CLASS_SCAN: &str = "scan";
/// Rate-limit class for scan-result lookups.
pub const CLASS_RESULTS: &str = "results";
/// Rate-limit class for threat-report lookups.
pub const CLASS_REPORTS: &str = "reports";

pub struct EnhancedClient {
    inner: Arc<dyn ScanApi>,
    cache: Option<CacheManager>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl EnhancedClient {
    /// Wrap a base client with neither cache nor limiter.
    pub fn new(inner: Arc<dyn ScanApi>) -> Self {
        Self {
            inner,
            cache: None,
            rate_limiter: None,
        }
    }

    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Assemble base client, cache and limiter from configuration. Disabled
    /// features are left out entirely.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let base = ScanClient::new(config)?;
        let mut client = Self::new(Arc::new(base));
        if config.cache.enabled {
            client = client.with_cache(CacheManager::from_settings(&config.cache));
        }
        if config.rate_limit.enabled {
            client = client.with_rate_limiter(Arc::new(RateLimiter::from_settings(
                &config.rate_limit,
            )));
        }
        Ok(client)
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    pub fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.rate_limiter.as_ref()
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "failed to clear cache");
            }
        }
    }

    pub fn reset_rate_limits(&self) {
        if let Some(rl) = &self.rate_limiter {
            rl.clear();
        }
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.as_ref().map(|c| c.stats()).unwrap_or_default()
    }

    pub fn get_rate_limiter_stats(&self) -> RateLimiterStats {
        self.rate_limiter
            .as_ref()
            .map(|rl| rl.stats())
            .unwrap_or_default()
    }

    pub fn rate_limit_status(&self, class: &str) -> Option<RateLimitStatus> {
        self.rate_limiter.as_ref().map(|rl| rl.status(class))
    }

    /// RateGate: wait for a token of `class`. Cancellation propagates; any
    /// other limiter fault is bypassed.
    async fn gate(&self, class: &'static str, options: &RequestOptions) -> Result<()> {
        let Some(rl) = &self.rate_limiter else {
            return Ok(());
        };
        match rl.wait_for_limit(class, options.cancel.as_ref()).await {
            Ok(()) => Ok(()),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!(class, error = %e, "rate limiter failed, bypassing");
                Ok(())
            }
        }
    }

    /// Cache-aware execution for content-keyed operations.
    ///
    /// `key` is computed lazily and only when a cache is configured;
    /// `cacheable` decides whether a fresh result may be stored.
    async fn execute_cached<T, K, C, F, Fut>(
        &self,
        class: &'static str,
        options: &RequestOptions,
        key: K,
        cacheable: C,
        call: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        K: FnOnce(&CacheManager) -> Result<CacheKey>,
        C: FnOnce(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.gate(class, options).await?;

        let cache = self.cache.as_ref().filter(|c| c.is_enabled());
        let key = match cache {
            None => None,
            Some(c) => match key(c) {
                Ok(k) => Some(k),
                Err(e) => {
                    warn!(class, error = %e, "cache key generation failed, bypassing cache");
                    None
                }
            },
        };

        if let (Some(c), Some(k)) = (cache, key.as_ref()) {
            if !options.bypass_cache {
                match c.get::<T>(k) {
                    Ok(Some(hit)) => {
                        debug!(class, key = %k, "cache hit");
                        return Ok(hit);
                    }
                    Ok(None) => debug!(class, key = %k, "cache miss"),
                    Err(e) => warn!(class, error = %e, "cache lookup failed, bypassing"),
                }
            }
        }

        let fresh = call().await?;

        if let (Some(c), Some(k)) = (cache, key.as_ref()) {
            if cacheable(&fresh) {
                match c.set(k, &fresh) {
                    Ok(true) => debug!(class, key = %k, "cached upstream result"),
                    Ok(false) => debug!(class, key = %k, "result not cached (size or disabled)"),
                    Err(e) => warn!(class, error = %e, "cache store failed"),
                }
            } else {
                debug!(class, key = %k, "result incomplete, not cached");
            }
        }

        Ok(fresh)
    }
}

#[async_trait]
impl ScanApi for EnhancedClient {
    async fn scan_sync(
        &self,
        request: &ScanRequest,
        options: &RequestOptions,
    ) -> Result<ScanResponse> {
        validate_scan_request(request)?;
        self.execute_cached(
            CLASS_SCAN,
            options,
            |c| c.keys().scan_key(request),
            |_| true,
            || self.inner.scan_sync(request, options),
        )
        .await
    }

    /// Not cached: a handle is not a content-keyed result.
    async fn scan_async(
        &self,
        requests: &[ScanRequest],
        options: &RequestOptions,
    ) -> Result<AsyncScanResponse> {
        validate_async_batch(requests)?;
        self.gate(CLASS_SCAN, options).await?;
        self.inner.scan_async(requests, options).await
    }

    /// Cached only once every requested id has completed.
    async fn get_scan_results(
        &self,
        scan_ids: &[String],
        options: &RequestOptions,
    ) -> Result<Vec<ScanIdResult>> {
        validate_ids(scan_ids, "scan_ids")?;
        self.execute_cached(
            CLASS_RESULTS,
            options,
            |c| c.keys().ids_key(OP_SCAN_RESULTS, scan_ids),
            |results: &Vec<ScanIdResult>| {
                !results.is_empty()
                    && results.iter().all(|r| r.is_complete())
                    && scan_ids
                        .iter()
                        .all(|id| results.iter().any(|r| &r.scan_id == id))
            },
            || self.inner.get_scan_results(scan_ids, options),
        )
        .await
    }

    async fn get_threat_scan_reports(
        &self,
        report_ids: &[String],
        options: &RequestOptions,
    ) -> Result<Vec<ThreatScanReport>> {
        validate_ids(report_ids, "report_ids")?;
        self.execute_cached(
            CLASS_REPORTS,
            options,
            |c| c.keys().ids_key(OP_THREAT_REPORTS, report_ids),
            |reports: &Vec<ThreatScanReport>| !reports.is_empty(),
            || self.inner.get_threat_scan_reports(report_ids, options),
        )
        .await
    }
}
