use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CancelReason, FtpError, Result};

/// Cancellation signal threaded through every operation that may block.
///
/// Wraps a [`CancellationToken`] and an optional deadline. Operations check
/// the signal before each blocking step and race it against chunk reads, so
/// worst-case abort latency is one chunk plus one blocking call.
///
/// The signal is cheap to clone; clones observe the same token and deadline.
///
/// # Example
///
/// ```ignore
/// let signal = CancelSignal::with_timeout(Duration::from_secs(30));
/// let copied = client.get(&signal, "/remote/a.json", "/tmp/a.json").await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that only triggers on an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also triggers once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A signal that also triggers at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Builds a signal around an existing token, e.g. one wired to OS
    /// signals by the hosting process.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Triggers the signal explicitly.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token, for callers composing their own wiring.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Why the signal has triggered, if it has.
    ///
    /// An explicit cancel takes precedence over an elapsed deadline when both
    /// hold.
    pub fn cause(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Explicit);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Some(CancelReason::DeadlineExceeded)
            }
            _ => None,
        }
    }

    /// Checkpoint: fails with [`FtpError::Cancelled`] if the signal has
    /// triggered, with no bytes accounted.
    pub fn check(&self) -> Result<()> {
        match self.cause() {
            Some(reason) => Err(FtpError::cancelled(reason)),
            None => Ok(()),
        }
    }

    /// Resolves once the signal triggers. Used to race blocking steps inside
    /// `tokio::select!`.
    pub async fn triggered(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => CancelReason::Explicit,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Explicit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_signal_is_untriggered() {
        let signal = CancelSignal::new();
        assert_eq!(signal.cause(), None);
        assert!(signal.check().is_ok());
    }

    #[tokio::test]
    async fn explicit_cancel_is_observed() {
        let signal = CancelSignal::new();
        signal.cancel();
        assert_eq!(signal.cause(), Some(CancelReason::Explicit));
        match signal.check() {
            Err(FtpError::Cancelled {
                reason: CancelReason::Explicit,
                bytes_copied: 0,
            }) => {}
            other => panic!("expected explicit cancellation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn elapsed_deadline_is_observed() {
        let signal = CancelSignal::with_timeout(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(signal.cause(), Some(CancelReason::DeadlineExceeded));
    }

    #[tokio::test]
    async fn explicit_cancel_wins_over_deadline() {
        let signal = CancelSignal::with_timeout(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5)).await;
        signal.cancel();
        assert_eq!(signal.cause(), Some(CancelReason::Explicit));
    }

    #[tokio::test]
    async fn triggered_resolves_on_cancel() {
        let signal = CancelSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.triggered().await });
        signal.cancel();
        assert_eq!(handle.await.unwrap(), CancelReason::Explicit);
    }

    #[tokio::test]
    async fn triggered_resolves_on_deadline() {
        let signal = CancelSignal::with_timeout(Duration::from_millis(10));
        assert_eq!(signal.triggered().await, CancelReason::DeadlineExceeded);
    }

    #[tokio::test]
    async fn clones_share_the_token() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        signal.cancel();
        assert_eq!(clone.cause(), Some(CancelReason::Explicit));
    }
}
