use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, warn};

use crate::client::policy::{Decision, RetryPolicy};
use crate::client::types::{cancellable, RequestOptions};
use crate::client::validation::{validate_async_batch, validate_ids, validate_scan_request};
use crate::config::BridgeConfig;
use crate::transport::HttpTransport;
use crate::types::{
    AsyncScanObject, AsyncScanResponse, ScanIdResult, ScanRequest, ScanResponse, ThreatScanReport,
};
use crate::Result;

pub const SYNC_SCAN_PATH: &str = "/v1/scan/sync/request";
pub const ASYNC_SCAN_PATH: &str = "/v1/scan/async/request";
pub const SCAN_RESULTS_PATH: &str = "/v1/scan/results";
pub const SCAN_REPORTS_PATH: &str = "/v1/scan/reports";

/// The four operations of the scanning API.
///
/// Implemented by the base [`ScanClient`] and by [`crate::client::EnhancedClient`],
/// so tool handlers can hold either behind `Arc<dyn ScanApi>`.
#[async_trait]
pub trait ScanApi: Send + Sync {
    async fn scan_sync(
        &self,
        request: &ScanRequest,
        options: &RequestOptions,
    ) -> Result<ScanResponse>;

    async fn scan_async(
        &self,
        requests: &[ScanRequest],
        options: &RequestOptions,
    ) -> Result<AsyncScanResponse>;

    async fn get_scan_results(
        &self,
        scan_ids: &[String],
        options: &RequestOptions,
    ) -> Result<Vec<ScanIdResult>>;

    async fn get_threat_scan_reports(
        &self,
        report_ids: &[String],
        options: &RequestOptions,
    ) -> Result<Vec<ThreatScanReport>>;
}

/// Base API client: typed operations over HTTP with retry and backoff.
pub struct ScanClient {
    pub(crate) transport: HttpTransport,
    pub(crate) policy: RetryPolicy,
}

impl ScanClient {
    /// Build a client from a validated configuration.
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport: HttpTransport::new(config)?,
            policy: RetryPolicy::new(config.max_retries, config.retry_delay()),
        })
    }

    pub fn builder() -> crate::client::builder::ScanClientBuilder {
        crate::client::builder::ScanClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Run `call` under the retry policy. Every attempt and every backoff
    /// sleep races the caller's cancellation token.
    async fn with_retry<T, F, Fut>(
        &self,
        method: &'static str,
        path: &'static str,
        options: &RequestOptions,
        call: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let url = self.transport.url(path);
        let cancel = options.cancel.as_ref();
        let mut attempt: u32 = 0;
        loop {
            debug!(
                method,
                url = url.as_str(),
                attempt = attempt + 1,
                "airs-bridge upstream attempt"
            );
            let err = match cancellable(cancel, call()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match self.policy.decide(&err, attempt) {
                Decision::Retry { delay } => {
                    warn!(
                        method,
                        url = url.as_str(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "airs-bridge retrying upstream call"
                    );
                    cancellable(cancel, async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                    attempt += 1;
                }
                Decision::Fail => {
                    debug!(
                        method,
                        url = url.as_str(),
                        attempts = attempt + 1,
                        status = err.status(),
                        "airs-bridge upstream call failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait]
impl ScanApi for ScanClient {
    async fn scan_sync(
        &self,
        request: &ScanRequest,
        options: &RequestOptions,
    ) -> Result<ScanResponse> {
        validate_scan_request(request)?;
        self.with_retry("POST", SYNC_SCAN_PATH, options, || {
            self.transport.post_json(SYNC_SCAN_PATH, request)
        })
        .await
    }

    async fn scan_async(
        &self,
        requests: &[ScanRequest],
        options: &RequestOptions,
    ) -> Result<AsyncScanResponse> {
        validate_async_batch(requests)?;
        let batch: Vec<AsyncScanObject> = requests
            .iter()
            .enumerate()
            .map(|(i, req)| AsyncScanObject {
                req_id: i as u32 + 1,
                scan_req: req.clone(),
            })
            .collect();
        self.with_retry("POST", ASYNC_SCAN_PATH, options, || {
            self.transport.post_json(ASYNC_SCAN_PATH, &batch)
        })
        .await
    }

    async fn get_scan_results(
        &self,
        scan_ids: &[String],
        options: &RequestOptions,
    ) -> Result<Vec<ScanIdResult>> {
        validate_ids(scan_ids, "scan_ids")?;
        let query = [("scan_ids", scan_ids.join(","))];
        self.with_retry("GET", SCAN_RESULTS_PATH, options, || {
            self.transport.get_json(SCAN_RESULTS_PATH, &query)
        })
        .await
    }

    async fn get_threat_scan_reports(
        &self,
        report_ids: &[String],
        options: &RequestOptions,
    ) -> Result<Vec<ThreatScanReport>> {
        validate_ids(report_ids, "report_ids")?;
        let query = [("report_ids", report_ids.join(","))];
        self.with_retry("GET", SCAN_REPORTS_PATH, options, || {
            self.transport.get_json(SCAN_REPORTS_PATH, &query)
        })
        .await
    }
}
