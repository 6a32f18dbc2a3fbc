use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// A single remote directory entry as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// Filters applied to a directory listing.
///
/// `extensions` is a case-insensitive allow-list of final extensions; empty
/// means no extension filtering. `pattern` is a case-sensitive regular
/// expression tested against the full entry name; empty means no pattern
/// filtering.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub extensions: Vec<String>,
    pub pattern: String,
}

impl FilterCriteria {
    pub fn new(extensions: Vec<String>, pattern: impl Into<String>) -> Self {
        Self {
            extensions,
            pattern: pattern.into(),
        }
    }
}

/// Configuration for FTP client operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpClientConfig {
    /// Server address, `host:port`
    pub addr: String,
    pub username: String,
    pub password: String,
    /// Bound on the initial dial; `None` falls back to the transport default.
    /// Streaming is bounded by the per-operation [`CancelSignal`] instead.
    ///
    /// [`CancelSignal`]: crate::CancelSignal
    #[serde(default)]
    pub timeout: Option<Duration>,
    /// Hint for callers that keep connections around between calls. The
    /// client itself dials a fresh connection per operation.
    #[serde(default)]
    pub persistent: bool,
    /// Companion hint to `persistent`.
    #[serde(default)]
    pub ttl: Option<Duration>,
    /// Buffer size for copy-engine chunks in bytes
    #[serde(default = "default_io_size")]
    pub io_size: usize,
}

fn default_io_size() -> usize {
    65536
}

impl FtpClientConfig {
    /// Creates a configuration with default transfer settings
    /// - timeout: none (transport default)
    /// - io_size: 65536 (64KB)
    pub fn new(
        addr: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            addr: addr.into(),
            username: username.into(),
            password: password.into(),
            timeout: None,
            persistent: false,
            ttl: None,
            io_size: default_io_size(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_io_size(mut self, io_size: usize) -> Self {
        self.io_size = io_size;
        self
    }
}

/// Internal configuration wrapper with Arc for shared ownership
#[derive(Debug, Clone)]
pub(crate) struct FtpClientConfigArc {
    pub(crate) inner: Arc<FtpClientConfig>,
}

impl From<FtpClientConfig> for FtpClientConfigArc {
    fn from(config: FtpClientConfig) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }
}

impl std::ops::Deref for FtpClientConfigArc {
    type Target = FtpClientConfig;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = FtpClientConfig::new("ftp.example.com:21", "user", "pass");
        assert_eq!(config.io_size, 65536);
        assert_eq!(config.timeout, None);
        assert!(!config.persistent);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: FtpClientConfig = serde_json::from_str(
            r#"{"addr":"ftp.example.com:21","username":"u","password":"p"}"#,
        )
        .unwrap();
        assert_eq!(config.addr, "ftp.example.com:21");
        assert_eq!(config.io_size, 65536);
        assert!(config.ttl.is_none());
    }
}
