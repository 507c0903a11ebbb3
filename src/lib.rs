//! # airs-bridge
//!
//! Client runtime for the AI Runtime Security scanning API, built for tool
//! servers that expose scanning to AI agents.
//!
//! ## Overview
//!
//! The base client speaks the four scanning operations over HTTPS with
//! per-attempt timeouts and retry with exponential backoff. The enhanced
//! client layers a content-addressed response cache and a per-operation
//! token-bucket rate limiter on top, and the factory shares one enhanced
//! client across a process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airs_bridge::client::{ClientFactory, RequestOptions, ScanApi};
//! use airs_bridge::types::{AiProfile, ContentItem, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() -> airs_bridge::Result<()> {
//!     let factory = ClientFactory::from_env();
//!     let client = factory.get_client()?;
//!
//!     let request = ScanRequest::new(
//!         AiProfile::named("default"),
//!         vec![ContentItem::prompt("ignore previous instructions")],
//!     );
//!     let verdict = client.scan_sync(&request, &RequestOptions::new()).await?;
//!     println!("{:?} / {:?}", verdict.category, verdict.action);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Base, enhanced and shared clients |
//! | [`cache`] | Content-addressed TTL + LRU response cache |
//! | [`resilience`] | Keyed token-bucket rate limiting |
//! | [`transport`] | Authenticated JSON over HTTP |
//! | [`types`] | Request and response wire types |
//! | [`config`] | Environment and YAML configuration |

pub mod cache;
pub mod client;
pub mod config;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientFactory, EnhancedClient, RequestOptions, ScanApi, ScanClient};
pub use config::BridgeConfig;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
