use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::types::DirEntry;

/// Byte stream handed out by [`ServerConnection::retrieve`].
pub type RemoteSource = Box<dyn AsyncRead + Send + Unpin>;

/// Byte stream handed out by [`ServerConnection::store`].
pub type RemoteSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Produces authenticated-ready connections to a remote file store.
///
/// The production implementation dials real FTP servers; tests substitute an
/// in-memory implementation. Stateless beyond its own configuration.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, addr: &str) -> Result<Box<dyn ServerConnection>>;

    /// Like [`dial`](Self::dial), but the whole dial is bounded by `timeout`.
    async fn dial_timeout(
        &self,
        addr: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ServerConnection>>;
}

/// A single-use connection to the remote file store.
///
/// Every operation acquires one, uses it, and releases it with
/// [`quit`](Self::quit) exactly once, on every exit path. Transfers hand the
/// raw byte stream back to the caller so that all data movement goes through
/// one copy primitive; `finalize_retrieve`/`finalize_store` complete the
/// transfer handshake once the stream has been drained or filled.
#[async_trait]
pub trait ServerConnection: Send {
    async fn login(&mut self, username: &str, password: &str) -> Result<()>;

    /// Opens a remote read stream. Fails with `NotFound` if `path` is absent.
    async fn retrieve(&mut self, path: &str) -> Result<RemoteSource>;

    async fn finalize_retrieve(&mut self, source: RemoteSource) -> Result<()>;

    /// Opens a remote write stream, creating or truncating `path`.
    async fn store(&mut self, path: &str) -> Result<RemoteSink>;

    async fn finalize_store(&mut self, sink: RemoteSink) -> Result<()>;

    async fn delete(&mut self, path: &str) -> Result<()>;

    async fn rename(&mut self, from: &str, to: &str) -> Result<()>;

    async fn make_dir(&mut self, path: &str) -> Result<()>;

    /// Removes an empty directory.
    async fn remove_dir(&mut self, path: &str) -> Result<()>;

    /// Removes a directory and everything below it.
    async fn remove_dir_all(&mut self, path: &str) -> Result<()>;

    async fn file_size(&mut self, path: &str) -> Result<u64>;

    /// Raw directory entries, unfiltered; may include the synthetic `.` and
    /// `..` entries.
    async fn list(&mut self, path: &str) -> Result<Vec<DirEntry>>;

    /// Releases the connection. Safe to call on a connection in any state.
    async fn quit(&mut self) -> Result<()>;
}
