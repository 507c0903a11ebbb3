//! Process-wide client factory.
//!
//! Hands out one shared [`EnhancedClient`], building it lazily from a config
//! loader on first use. A failed build leaves the factory uninitialized.

use arc_swap::ArcSwapOption;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::client::enhanced::EnhancedClient;
use crate::config::BridgeConfig;
use crate::{Error, Result};

type ConfigLoader = dyn Fn() -> Result<BridgeConfig> + Send + Sync;

pub struct ClientFactory {
    loader: Box<ConfigLoader>,
    client: ArcSwapOption<EnhancedClient>,
    build_lock: Mutex<()>,
}

impl ClientFactory {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<BridgeConfig> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            client: ArcSwapOption::empty(),
            build_lock: Mutex::new(()),
        }
    }

    /// Factory that reads `AIRS_*` environment variables on each build.
    pub fn from_env() -> Self {
        Self::new(BridgeConfig::from_env)
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self::new(move || Ok(config.clone()))
    }

    /// Return the shared client, building it on first call.
    ///
    /// Concurrent first calls build at most once.
    pub fn get_client(&self) -> Result<Arc<EnhancedClient>> {
        if let Some(client) = self.client.load_full() {
            return Ok(client);
        }

        let _guard = self
            .build_lock
            .lock()
            .map_err(|_| Error::configuration("client factory lock poisoned"))?;
        if let Some(client) = self.client.load_full() {
            return Ok(client);
        }

        let config = (self.loader)()?;
        config.validate()?;
        let client = Arc::new(EnhancedClient::from_config(&config)?);
        info!(
            api_url = %config.api_url,
            cache = config.cache.enabled,
            rate_limit = config.rate_limit.enabled,
            "scan client initialized"
        );
        self.client.store(Some(client.clone()));
        Ok(client)
    }

    /// Drop the shared client after clearing its cache and limiter state.
    /// The next [`get_client`](Self::get_client) builds a fresh one.
    pub fn reset_client(&self) {
        if let Some(old) = self.client.swap(None) {
            old.clear_cache();
            old.reset_rate_limits();
            debug!("scan client reset");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.client.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> BridgeConfig {
        BridgeConfig::new("test-key")
    }

    #[test]
    fn builds_once_and_shares() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let factory = ClientFactory::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(config())
        });

        assert!(!factory.is_initialized());
        let a = factory.get_client().unwrap();
        let b = factory.get_client().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(factory.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_calls_build_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let factory = Arc::new(ClientFactory::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(config())
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = factory.clone();
                std::thread::spawn(move || f.get_client().unwrap())
            })
            .collect();
        let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(clients.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn invalid_config_leaves_factory_uninitialized() {
        let factory = ClientFactory::with_config(BridgeConfig::new(""));
        let err = factory.get_client().err().unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(!factory.is_initialized());
    }

    #[test]
    fn loader_errors_propagate() {
        let factory = ClientFactory::new(|| Err(Error::configuration("no key")));
        assert!(factory.get_client().is_err());
        assert!(!factory.is_initialized());
    }

    #[test]
    fn reset_is_idempotent_and_rebuilds() {
        let factory = ClientFactory::with_config(config());
        factory.reset_client();

        let first = factory.get_client().unwrap();
        factory.reset_client();
        factory.reset_client();
        assert!(!factory.is_initialized());

        let second = factory.get_client().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn disabled_features_are_left_out() {
        let mut cfg = config();
        cfg.cache.enabled = false;
        cfg.rate_limit.enabled = false;
        let client = ClientFactory::with_config(cfg).get_client().unwrap();
        assert!(client.cache().is_none());
        assert!(client.rate_limiter().is_none());
    }
}
