use std::fmt;

use thiserror::Error;

/// Why a cancellation signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled explicitly (e.g. a signal handler fired the token).
    Explicit,
    /// The signal's deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Explicit => write!(f, "cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Errors produced by FTP operations.
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was aborted by its cancellation signal.
    ///
    /// `bytes_copied` is the number of bytes fully written before the abort
    /// was observed; it is zero when the operation was cancelled before any
    /// data moved.
    #[error("operation cancelled ({reason}), {bytes_copied} bytes copied")]
    Cancelled {
        reason: CancelReason,
        bytes_copied: u64,
    },

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl FtpError {
    /// Cancellation error for a checkpoint hit before any data moved.
    pub(crate) fn cancelled(reason: CancelReason) -> Self {
        FtpError::Cancelled {
            reason,
            bytes_copied: 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, FtpError>;
