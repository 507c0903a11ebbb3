//! Scan response types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Benign,
    Malicious,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Block,
    Review,
    #[serde(other)]
    Unknown,
}

/// Threat flags raised for one side (prompt or response) of a scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionFlags {
    #[serde(default)]
    pub url_cats: bool,
    #[serde(default)]
    pub dlp: bool,
    #[serde(default)]
    pub injection: bool,
    #[serde(default)]
    pub toxic_content: bool,
    #[serde(default)]
    pub malicious_code: bool,
    #[serde(default)]
    pub agent: bool,
    #[serde(default)]
    pub topic_violation: bool,
    /// Flags this client does not know about yet.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DetectionFlags {
    /// Names of every raised flag, known flags first.
    pub fn raised(&self) -> Vec<String> {
        let known = [
            ("url_cats", self.url_cats),
            ("dlp", self.dlp),
            ("injection", self.injection),
            ("toxic_content", self.toxic_content),
            ("malicious_code", self.malicious_code),
            ("agent", self.agent),
            ("topic_violation", self.topic_violation),
        ];
        let mut out: Vec<String> = known
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| name.to_string())
            .collect();
        out.extend(
            self.extra
                .iter()
                .filter(|(_, v)| v.as_bool() == Some(true))
                .map(|(k, _)| k.clone()),
        );
        out
    }
}

/// Verdict for a synchronous scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub report_id: String,
    pub scan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tr_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    pub category: Category,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_detected: Option<DetectionFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_detected: Option<DetectionFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl ScanResponse {
    /// Threat categories raised on either side, prefixed with `prompt.`/`response.`.
    pub fn threats(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(p) = &self.prompt_detected {
            out.extend(p.raised().into_iter().map(|t| format!("prompt.{}", t)));
        }
        if let Some(r) = &self.response_detected {
            out.extend(r.raised().into_iter().map(|t| format!("response.{}", t)));
        }
        out
    }

    pub fn is_blocked(&self) -> bool {
        self.action == Action::Block
    }
}

/// Acknowledgement of an async scan batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncScanResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    pub scan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Complete,
    Pending,
    #[serde(other)]
    Unknown,
}

/// Result lookup for one scan id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanIdResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req_id: Option<u32>,
    pub status: ScanStatus,
    pub scan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResponse>,
}

impl ScanIdResult {
    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Complete
    }
}

/// One detection service's finding inside a threat report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatScanReport {
    pub report_id: String,
    pub scan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub detection_results: Vec<DetectionResult>,
}
