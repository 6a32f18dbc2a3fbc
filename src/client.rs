use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::connection::{Dialer, ServerConnection};
use crate::error::Result;
use crate::operations::{download, folder, list, remove, rename, stat, upload};
use crate::signal::CancelSignal;
use crate::transport::FtpDialer;
use crate::types::{DirEntry, FilterCriteria, FtpClientConfig, FtpClientConfigArc};

/// FTP client for performing file operations on a remote server
///
/// Every operation dials its own connection, performs its work and releases
/// the connection before returning; there is no pooling and no shared
/// session state. Operations that may block take a [`CancelSignal`] and
/// observe it before each blocking step.
#[derive(Clone)]
pub struct FtpClient {
    pub(crate) config: FtpClientConfigArc,
    pub(crate) dialer: Arc<dyn Dialer>,
}

impl FtpClient {
    /// Creates a client that dials real FTP servers.
    pub fn new(config: FtpClientConfig) -> Self {
        Self::with_dialer(config, Arc::new(FtpDialer))
    }

    /// Creates a client over a custom dialer. Tests pass an in-memory
    /// implementation here.
    pub fn with_dialer(config: FtpClientConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            config: config.into(),
            dialer,
        }
    }

    /// Dials and authenticates a fresh connection.
    ///
    /// A configured `timeout` bounds the dial (and only the dial). When the
    /// login is rejected, the freshly dialed connection is released before
    /// the authentication error is returned, so no socket leaks on bad
    /// credentials.
    ///
    /// Most callers never need this directly, since each operation connects on
    /// its own. It is public for callers that want a raw session.
    pub async fn connect(&self) -> Result<Box<dyn ServerConnection>> {
        let connect_time = Instant::now();
        debug!(
            "Connecting to {:?} with timeout {:?}",
            self.config.addr, self.config.timeout
        );

        let mut conn = match self.config.timeout {
            Some(timeout) => self.dialer.dial_timeout(&self.config.addr, timeout).await?,
            None => self.dialer.dial(&self.config.addr).await?,
        };

        if let Err(err) = conn
            .login(&self.config.username, &self.config.password)
            .await
        {
            crate::operations::release(conn.as_mut()).await;
            return Err(err);
        }

        debug!(
            "Connected to {:?} in {:?}",
            self.config.addr,
            connect_time.elapsed()
        );
        Ok(conn)
    }

    /// Downloads a file from the remote server to local storage
    ///
    /// # Arguments
    ///
    /// * `signal` - Cancellation signal bounding the whole operation
    /// * `remote_path` - Path to the remote file
    /// * `local_path` - Local destination path, created or truncated
    ///
    /// # Returns
    ///
    /// Returns the number of bytes copied. A cancellation mid-transfer
    /// returns [`FtpError::Cancelled`] and leaves the destination partially
    /// written.
    ///
    /// [`FtpError::Cancelled`]: crate::FtpError::Cancelled
    ///
    /// # Example
    ///
    /// ```ignore
    /// let signal = CancelSignal::new();
    /// let copied = client.get(&signal, "/remote/file.txt", "/local/file.txt").await?;
    /// println!("{copied} bytes downloaded");
    /// ```
    pub async fn get(
        &self,
        signal: &CancelSignal,
        remote_path: &str,
        local_path: &str,
    ) -> Result<u64> {
        download::get(self, signal, remote_path, local_path).await
    }

    /// Opens a remote file for streaming reads without writing local storage
    ///
    /// The returned [`RemoteReader`] owns its connection; call
    /// [`RemoteReader::close`] when done.
    ///
    /// [`RemoteReader`]: crate::RemoteReader
    /// [`RemoteReader::close`]: crate::RemoteReader::close
    pub async fn get_reader(
        &self,
        signal: &CancelSignal,
        remote_path: &str,
    ) -> Result<download::RemoteReader> {
        download::get_reader(self, signal, remote_path).await
    }

    /// Uploads a local file to the remote server
    ///
    /// # Arguments
    ///
    /// * `signal` - Cancellation signal bounding the whole operation
    /// * `local_path` - Path to the local file
    /// * `remote_path` - Destination path on the remote server
    ///
    /// # Returns
    ///
    /// Returns the number of bytes copied. Remote parent directories are not
    /// created automatically; call [`ensure_folder`](Self::ensure_folder)
    /// first when the destination folder may be missing.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let signal = CancelSignal::new();
    /// client.ensure_folder(&signal, "out/2026").await?;
    /// client.put(&signal, "/local/report.json", "out/2026/report.json").await?;
    /// ```
    pub async fn put(
        &self,
        signal: &CancelSignal,
        local_path: &str,
        remote_path: &str,
    ) -> Result<u64> {
        upload::put(self, signal, local_path, remote_path).await
    }

    /// Lists the contents of a remote directory, filtered
    ///
    /// # Arguments
    ///
    /// * `signal` - Cancellation signal; a triggered signal yields an empty
    ///   result
    /// * `remote_dir` - Path to the remote directory
    /// * `criteria` - Extension allow-list and name pattern
    ///
    /// # Returns
    ///
    /// Returns the surviving entries in server order. Fetch failures are
    /// swallowed into an empty result, so an empty directory and a broken
    /// listing look the same to callers.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let criteria = FilterCriteria::new(vec!["json".into()], "");
    /// let entries = client.ls(&signal, "in", &criteria).await;
    /// for entry in entries {
    ///     println!("{} ({} bytes)", entry.name, entry.size);
    /// }
    /// ```
    pub async fn ls(
        &self,
        signal: &CancelSignal,
        remote_dir: &str,
        criteria: &FilterCriteria,
    ) -> Vec<DirEntry> {
        list::ls(self, signal, remote_dir, criteria).await
    }

    /// Removes a remote file
    pub async fn remove(&self, signal: &CancelSignal, path: &str) -> Result<()> {
        remove::remove(self, signal, path).await
    }

    /// Removes an empty remote directory
    pub async fn remove_dir(&self, signal: &CancelSignal, path: &str) -> Result<()> {
        remove::remove_dir(self, signal, path).await
    }

    /// Removes a remote directory and everything below it
    pub async fn remove_dir_all(&self, signal: &CancelSignal, path: &str) -> Result<()> {
        remove::remove_dir_all(self, signal, path).await
    }

    /// Renames a remote path, creating the destination's parent chain first
    pub async fn rename(&self, signal: &CancelSignal, from: &str, to: &str) -> Result<()> {
        rename::rename(self, signal, from, to).await
    }

    /// Creates a single remote directory; the parent must exist
    pub async fn make_dir(&self, signal: &CancelSignal, path: &str) -> Result<()> {
        folder::make_dir(self, signal, path).await
    }

    /// Ensures a remote directory and its parent chain exist
    pub async fn ensure_folder(&self, signal: &CancelSignal, path: &str) -> Result<()> {
        folder::ensure_folder(self, signal, path).await
    }

    /// Size in bytes of a remote file
    pub async fn file_size(&self, signal: &CancelSignal, path: &str) -> Result<u64> {
        stat::file_size(self, signal, path).await
    }

    /// Whether a remote path exists
    ///
    /// Implemented as a filtered listing of the parent folder, so it costs as
    /// much as [`ls`](Self::ls). Returns `false` (not an error) when nothing
    /// matched.
    pub async fn exists(&self, signal: &CancelSignal, path: &str) -> Result<bool> {
        stat::exists(self, signal, path).await
    }
}
