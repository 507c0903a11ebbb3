//! Scan request types.

use serde::{Deserialize, Serialize};

/// Security profile a scan is evaluated against. Exactly one of name or id is
/// normally set; both are accepted and both participate in cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AiProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
}

impl AiProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            profile_id: None,
            profile_name: Some(name.into()),
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            profile_id: Some(id.into()),
            profile_name: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.profile_id) && blank(&self.profile_name)
    }
}

/// One unit of content to scan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ContentItem {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            prompt: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.response = Some(text.into());
        self
    }

    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        self.context = Some(text.into());
        self
    }

    pub fn has_text(&self) -> bool {
        [&self.prompt, &self.response, &self.context]
            .iter()
            .any(|f| f.as_deref().map_or(false, |s| !s.is_empty()))
    }
}

/// Caller metadata. Carried upstream but never part of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
}

/// A synchronous scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Caller-supplied transaction id used for correlation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tr_id: Option<String>,
    pub ai_profile: AiProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ScanMetadata>,
    pub contents: Vec<ContentItem>,
}

impl ScanRequest {
    /// Request with a freshly generated transaction id.
    pub fn new(ai_profile: AiProfile, contents: Vec<ContentItem>) -> Self {
        Self {
            tr_id: Some(uuid::Uuid::new_v4().to_string()),
            ai_profile,
            metadata: None,
            contents,
        }
    }

    pub fn with_tr_id(mut self, tr_id: impl Into<String>) -> Self {
        self.tr_id = Some(tr_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ScanMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Envelope for one request inside an async batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncScanObject {
    pub req_id: u32,
    pub scan_req: ScanRequest,
}
