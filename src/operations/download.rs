use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::fs;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::{debug, info};

use crate::client::FtpClient;
use crate::connection::{RemoteSource, ServerConnection};
use crate::copy::copy;
use crate::error::Result;
use crate::operations::release;
use crate::signal::CancelSignal;

/// Downloads a file from the remote server to local storage
///
/// Dials a fresh connection, opens the remote read stream, creates or
/// truncates the local destination and moves the bytes through the copy
/// engine. The connection is released on every exit path. A cancellation
/// mid-copy leaves the destination partially written; reconciliation is the
/// caller's concern.
///
/// # Errors
///
/// - `NotFound` if the remote file is absent
/// - `Io` if the local file cannot be created or written
/// - `Cancelled` if the signal triggers before or during the transfer
pub async fn get(
    client: &FtpClient,
    signal: &CancelSignal,
    remote_path: &str,
    local_path: &str,
) -> Result<u64> {
    let download_time = Instant::now();
    signal.check()?;

    let mut conn = client.connect().await?;
    let result = transfer(client, conn.as_mut(), signal, remote_path, local_path).await;
    release(conn.as_mut()).await;
    let copied = result?;

    info!(
        "File {:?} downloaded to {:?} ({} bytes). Time taken {:?}",
        remote_path,
        local_path,
        copied,
        download_time.elapsed(),
    );
    Ok(copied)
}

async fn transfer(
    client: &FtpClient,
    conn: &mut dyn ServerConnection,
    signal: &CancelSignal,
    remote_path: &str,
    local_path: &str,
) -> Result<u64> {
    signal.check()?;
    let mut source = conn.retrieve(remote_path).await?;
    debug!("Remote file opened: {:?}", remote_path);

    signal.check()?;
    let mut local_file = fs::File::create(local_path).await?;
    debug!("Local file created: {:?}", local_path);

    signal.check()?;
    let copied = copy(signal, &mut source, &mut local_file, client.config.io_size).await?;
    conn.finalize_retrieve(source).await?;
    Ok(copied)
}

/// Opens a remote file for streaming consumption.
///
/// Unlike [`get`], no local file is written; the caller reads the bytes
/// directly. The handle owns the connection that backs it, so it must be
/// released with [`RemoteReader::close`]; dropping the reader without
/// closing abandons the control connection.
pub async fn get_reader(
    client: &FtpClient,
    signal: &CancelSignal,
    remote_path: &str,
) -> Result<RemoteReader> {
    signal.check()?;
    let mut conn = client.connect().await?;
    match conn.retrieve(remote_path).await {
        Ok(source) => {
            debug!("Remote file opened for streaming: {:?}", remote_path);
            Ok(RemoteReader {
                conn,
                source: Some(source),
            })
        }
        Err(err) => {
            release(conn.as_mut()).await;
            Err(err)
        }
    }
}

/// Streaming handle returned by [`get_reader`]; reads bytes straight off the
/// remote connection.
pub struct RemoteReader {
    conn: Box<dyn ServerConnection>,
    source: Option<RemoteSource>,
}

impl std::fmt::Debug for RemoteReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteReader")
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl RemoteReader {
    /// Finalizes the transfer and releases the underlying connection.
    pub async fn close(mut self) -> Result<()> {
        let finalized = match self.source.take() {
            Some(source) => self.conn.finalize_retrieve(source).await,
            None => Ok(()),
        };
        release(self.conn.as_mut()).await;
        finalized
    }
}

impl AsyncRead for RemoteReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.source.as_mut() {
            Some(source) => Pin::new(source).poll_read(cx, buf),
            None => Poll::Ready(Ok(())),
        }
    }
}
