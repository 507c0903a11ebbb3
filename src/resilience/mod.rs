//! # Resilience Primitives Module
//!
//! Outbound throughput control for the scanning API.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`rate_limiter`] | Keyed token-bucket rate limiter, one bucket per operation class |
//!
//! ## Rate Limiter
//!
//! Each operation class (`scan`, `results`, `reports`) gets its own bucket,
//! created at full capacity on first use. Tokens come back in whole-window
//! increments only.
//!
//! ```rust
//! use airs_bridge::resilience::rate_limiter::{RateLimiter, RateLimiterConfig};
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new(RateLimiterConfig::new(2, Duration::from_secs(1)));
//! assert!(limiter.try_consume("scan"));
//! assert!(limiter.try_consume("scan"));
//! assert!(!limiter.try_consume("scan"));
//! assert!(limiter.try_consume("reports"));
//! ```

pub mod rate_limiter;

pub use rate_limiter::{RateLimitStatus, RateLimiter, RateLimiterConfig, RateLimiterStats};
