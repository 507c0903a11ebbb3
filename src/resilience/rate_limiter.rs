use crate::config::RateLimitSettings;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Buckets idle for less than this are never swept, however short the window.
const MIN_IDLE_THRESHOLD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Tokens granted per window (also the bucket capacity).
    pub max_requests: u32,
    pub window: Duration,
    /// When false every check succeeds and nothing is tracked.
    pub enabled: bool,
}

impl RateLimiterConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window: settings.window(),
            enabled: settings.enabled,
        }
    }

    /// Idle time after which a bucket is dropped: two windows, at least 60s.
    pub fn idle_threshold(&self) -> Duration {
        self.window.saturating_mul(2).max(MIN_IDLE_THRESHOLD)
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(60))
    }
}

/// Observability view of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub available: u32,
    pub limit: u32,
    /// When the bucket next refills.
    pub reset_at: Instant,
}

impl RateLimitStatus {
    pub fn reset_in(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimiterStats {
    pub bucket_count: usize,
    pub enabled: bool,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    /// Start of the current window. Advances only in whole windows.
    window_start: Instant,
    last_seen: Instant,
}

impl Bucket {
    fn full(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity,
            window_start: now,
            last_seen: now,
        }
    }

    /// Add `capacity` tokens per elapsed whole window, capped at capacity.
    /// Partial windows grant nothing.
    fn refill(&mut self, cfg: &RateLimiterConfig, now: Instant) {
        let window = cfg.window.as_nanos().max(1);
        let elapsed = now.saturating_duration_since(self.window_start).as_nanos();
        let windows = elapsed / window;
        if windows == 0 {
            return;
        }
        let granted = windows.saturating_mul(cfg.max_requests as u128);
        self.tokens = (self.tokens as u128 + granted).min(cfg.max_requests as u128) as u32;
        let advance = window.saturating_mul(windows).min(u64::MAX as u128) as u64;
        self.window_start += Duration::from_nanos(advance);
    }

    fn reset_at(&self, cfg: &RateLimiterConfig) -> Instant {
        self.window_start + cfg.window
    }
}

#[derive(Debug)]
struct State {
    buckets: HashMap<String, Bucket>,
    last_sweep: Instant,
}

/// Token-bucket rate limiter with one bucket per operation class.
///
/// - Buckets are created lazily at full capacity
/// - Tokens accrue in whole-window increments only
/// - Idle buckets are swept lazily
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(State {
                buckets: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(RateLimiterConfig::from_settings(settings))
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.cfg
    }

    pub fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::Limiter {
            message: "rate limiter state poisoned".to_string(),
        })
    }

    fn maybe_sweep(&self, st: &mut State, now: Instant) {
        let threshold = self.cfg.idle_threshold();
        if now.saturating_duration_since(st.last_sweep) >= threshold {
            Self::sweep_locked(st, now, threshold);
        }
    }

    fn sweep_locked(st: &mut State, now: Instant, threshold: Duration) -> usize {
        let before = st.buckets.len();
        st.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_seen) < threshold);
        st.last_sweep = now;
        before - st.buckets.len()
    }

    /// Refill and take one token. `Ok(None)` on success, otherwise the
    /// instant the bucket next refills.
    fn consume_locked(&self, key: &str, now: Instant) -> Result<Option<Instant>> {
        let mut st = self.lock()?;
        self.maybe_sweep(&mut st, now);
        let cfg = &self.cfg;
        let bucket = st
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::full(cfg.max_requests, now));
        bucket.refill(cfg, now);
        bucket.last_seen = now;
        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            Ok(None)
        } else {
            Ok(Some(bucket.reset_at(cfg)))
        }
    }

    /// Non-blocking check: consume one token for `key` if available.
    ///
    /// A faulty limiter fails open.
    pub fn try_consume(&self, key: &str) -> bool {
        if !self.cfg.enabled {
            return true;
        }
        match self.consume_locked(key, Instant::now()) {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                warn!(key, error = %e, "rate limiter unavailable, allowing request");
                true
            }
        }
    }

    /// Wait until a token for `key` is available, then consume it.
    ///
    /// Sleeps until the bucket's next window boundary rather than polling.
    pub async fn wait_for_limit(
        &self,
        key: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        if !self.cfg.enabled {
            return Ok(());
        }
        loop {
            let reset_at = match self.consume_locked(key, Instant::now())? {
                None => return Ok(()),
                Some(at) => at,
            };
            debug!(
                key,
                wait_ms = reset_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                "rate limit reached, waiting for next window"
            );
            match cancel {
                None => tokio::time::sleep_until(reset_at).await,
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep_until(reset_at) => {}
                    }
                }
            }
        }
    }

    /// Current state of `key`'s bucket. Does not create one.
    pub fn status(&self, key: &str) -> RateLimitStatus {
        let now = Instant::now();
        let limit = self.cfg.max_requests;
        let fresh = RateLimitStatus {
            available: limit,
            limit,
            reset_at: now + self.cfg.window,
        };
        if !self.cfg.enabled {
            return fresh;
        }
        let mut st = match self.lock() {
            Ok(st) => st,
            Err(_) => return fresh,
        };
        match st.buckets.get_mut(key) {
            None => fresh,
            Some(bucket) => {
                bucket.refill(&self.cfg, now);
                RateLimitStatus {
                    available: bucket.tokens,
                    limit,
                    reset_at: bucket.reset_at(&self.cfg),
                }
            }
        }
    }

    /// Forget one bucket; the next touch starts at full capacity.
    pub fn reset(&self, key: &str) {
        if let Ok(mut st) = self.lock() {
            st.buckets.remove(key);
        }
    }

    /// Forget every bucket.
    pub fn clear(&self) {
        if let Ok(mut st) = self.lock() {
            st.buckets.clear();
        }
    }

    /// Drop buckets idle for at least [`RateLimiterConfig::idle_threshold`].
    pub fn cleanup_idle(&self) -> usize {
        let now = Instant::now();
        match self.lock() {
            Ok(mut st) => Self::sweep_locked(&mut st, now, self.cfg.idle_threshold()),
            Err(_) => 0,
        }
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            bucket_count: self.lock().map(|st| st.buckets.len()).unwrap_or(0),
            enabled: self.cfg.enabled,
        }
    }

    /// Poison the state mutex so every later call hits the fault path.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.state.lock();
            panic!("poisoning rate limiter state");
        }));
    }
}
