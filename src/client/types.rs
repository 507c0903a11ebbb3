use crate::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Per-call options accepted by every scan operation.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Skip the cache lookup. A fresh, complete result is still stored.
    pub bypass_cache: bool,
    /// Caller cancellation. Takes precedence over the client's own timeout.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bypass_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Race `fut` against the caller's cancellation token, if any.
pub(crate) async fn cancellable<T, F>(cancel: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        None => fut.await,
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                out = fut => out,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn passes_through_without_token() {
        let out = cancellable(None, async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_wins_over_pending_future() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let out = cancellable(Some(&token), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, Error>(())
        })
        .await;
        assert!(matches!(out, Err(Error::Cancelled)));
    }
}
