//! Cache key generation.
//!
//! Keys hash only content-bearing fields. Transaction ids and caller metadata
//! never participate, so identical content always resolves to the same entry.

use crate::types::ScanRequest;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
    pub operation: Option<String>,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            operation: None,
        }
    }

    pub fn with_operation(mut self, op: impl Into<String>) -> Self {
        self.operation = Some(op.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

pub const OP_SCAN_SYNC: &str = "scan_sync";
pub const OP_SCAN_RESULTS: &str = "scan_results";
pub const OP_THREAT_REPORTS: &str = "threat_reports";

// Field order is fixed by the struct definitions, so serialization is stable.
#[derive(Serialize)]
struct CanonicalScan<'a> {
    op: &'static str,
    profile_id: Option<&'a str>,
    profile_name: Option<&'a str>,
    contents: Vec<CanonicalContent<'a>>,
    salt: Option<&'a str>,
}

#[derive(Serialize)]
struct CanonicalContent<'a> {
    prompt: Option<&'a str>,
    response: Option<&'a str>,
    context: Option<&'a str>,
}

#[derive(Serialize)]
struct CanonicalIds<'a> {
    op: &'a str,
    ids: &'a [String],
    salt: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator {
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self { salt: None }
    }

    /// Mix a namespace into every key (e.g. per tenant).
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Key for a synchronous scan: profile plus ordered content items.
    pub fn scan_key(&self, request: &ScanRequest) -> Result<CacheKey> {
        let canonical = CanonicalScan {
            op: OP_SCAN_SYNC,
            profile_id: request.ai_profile.profile_id.as_deref(),
            profile_name: request.ai_profile.profile_name.as_deref(),
            contents: request
                .contents
                .iter()
                .map(|c| CanonicalContent {
                    prompt: c.prompt.as_deref(),
                    response: c.response.as_deref(),
                    context: c.context.as_deref(),
                })
                .collect(),
            salt: self.salt.as_deref(),
        };
        let bytes = serde_json::to_vec(&canonical).map_err(|e| Error::Cache {
            message: format!("failed to serialize scan key: {}", e),
        })?;
        Ok(CacheKey::new(sha256_hex(&bytes)).with_operation(OP_SCAN_SYNC))
    }

    /// Key for an id lookup. `operation` namespaces result and report lookups.
    pub fn ids_key(&self, operation: &str, ids: &[String]) -> Result<CacheKey> {
        let canonical = CanonicalIds {
            op: operation,
            ids,
            salt: self.salt.as_deref(),
        };
        let bytes = serde_json::to_vec(&canonical).map_err(|e| Error::Cache {
            message: format!("failed to serialize id key: {}", e),
        })?;
        Ok(CacheKey::new(sha256_hex(&bytes)).with_operation(operation))
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
