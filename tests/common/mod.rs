//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use airs_bridge::config::BridgeConfig;
use airs_bridge::types::{AiProfile, ContentItem, ScanRequest};
use mockito::{Matcher, Mock, Server, ServerGuard};

pub const API_KEY: &str = "test-key";

/// Test fixture that owns a mock scanning API
pub struct MockApi {
    pub server: ServerGuard,
}

impl MockApi {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    /// Configuration pointing at the mock server with fast retries and
    /// caching / rate limiting switched off.
    pub fn config(&self) -> BridgeConfig {
        let mut cfg = BridgeConfig::new(API_KEY);
        cfg.api_url = self.server.url();
        cfg.timeout_ms = 2_000;
        cfg.max_retries = 2;
        cfg.retry_delay_ms = 10;
        cfg.cache.enabled = false;
        cfg.rate_limit.enabled = false;
        cfg
    }

    pub async fn mock_post(&mut self, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", path)
            .match_header("x-pan-token", API_KEY)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// GET mock matching a single decoded query parameter.
    pub async fn mock_get(
        &mut self,
        path: &str,
        param: (&str, &str),
        status: usize,
        body: &str,
    ) -> Mock {
        self.server
            .mock("GET", path)
            .match_header("x-pan-token", API_KEY)
            .match_query(Matcher::UrlEncoded(param.0.into(), param.1.into()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn scan_request(prompt: &str) -> ScanRequest {
    ScanRequest::new(AiProfile::named("default"), vec![ContentItem::prompt(prompt)])
}

pub fn benign_verdict() -> String {
    serde_json::json!({
        "report_id": "R0001",
        "scan_id": "S0001",
        "tr_id": "tx-upstream",
        "profile_name": "default",
        "category": "benign",
        "action": "allow",
        "prompt_detected": { "url_cats": false, "dlp": false, "injection": false }
    })
    .to_string()
}

pub fn malicious_verdict() -> String {
    serde_json::json!({
        "report_id": "R0002",
        "scan_id": "S0002",
        "category": "malicious",
        "action": "block",
        "prompt_detected": { "injection": true, "dlp": false }
    })
    .to_string()
}
