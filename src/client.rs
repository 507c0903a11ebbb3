//! Scanning API clients.
//!
//! Keep the public surface small: a base [`ScanClient`] that talks HTTP with
//! retries, an [`EnhancedClient`] that layers caching and rate limiting on
//! top, and a [`ClientFactory`] that shares one enhanced client per process.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod enhanced;
pub mod factory;
mod policy;
pub mod types;
mod validation;

pub use builder::ScanClientBuilder;
pub use core::{ScanApi, ScanClient};
pub use enhanced::{EnhancedClient, CLASS_REPORTS, CLASS_RESULTS, CLASS_SCAN};
pub use factory::ClientFactory;
pub use types::RequestOptions;
pub use validation::MAX_BATCH_SIZE;
