//! Cancellation of in-flight service calls.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BrowserError, BrowserResult};

/// Shared cancellation handle for one session.
///
/// Every component of a session holds a clone. [`CancelHandle::cancel`]
/// aborts all calls currently racing the active token and arms a fresh one,
/// so later calls run normally.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently armed token.
    pub fn token(&self) -> CancellationToken {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Cancel everything in flight and arm a fresh token.
    pub fn cancel(&self) {
        let mut token = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        token.cancel();
        *token = CancellationToken::new();
        debug!("in-flight service calls cancelled");
    }

    /// Run a service call, returning [`BrowserError::Cancelled`] if the
    /// handle is cancelled first.
    pub async fn run<T, F>(&self, call: F) -> BrowserResult<T>
    where
        F: Future<Output = protocol::Result<T>>,
    {
        let token = self.token();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(BrowserError::Cancelled),
            result = call => result.map_err(BrowserError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let handle = CancelHandle::new();
        let value = handle.run(async { Ok::<_, protocol::ProtocolError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_call() {
        let handle = CancelHandle::new();
        let canceller = handle.clone();

        let pending = tokio::spawn(async move {
            handle
                .run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok::<_, protocol::ProtocolError>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(BrowserError::Cancelled)));
    }

    #[tokio::test]
    async fn test_fresh_token_after_cancel() {
        let handle = CancelHandle::new();
        handle.cancel();
        assert!(!handle.token().is_cancelled());

        let value = handle.run(async { Ok::<_, protocol::ProtocolError>("ok") }).await;
        assert_eq!(value.unwrap(), "ok");
    }
}
