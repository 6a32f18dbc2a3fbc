use std::time::Instant;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::client::FtpClient;
use crate::connection::ServerConnection;
use crate::copy::copy;
use crate::error::Result;
use crate::operations::release;
use crate::signal::CancelSignal;

/// Uploads a local file to the remote server
///
/// Same engine as the download path with source and sink reversed: the local
/// file is the source, the remote store stream the sink. The connection is
/// released on every exit path.
///
/// Parent directories on the remote side are NOT created here; callers that
/// need them use [`ensure_folder`] first.
///
/// [`ensure_folder`]: crate::FtpClient::ensure_folder
///
/// # Errors
///
/// - `Io` if the local file cannot be opened or read
/// - `Cancelled` if the signal triggers before or during the transfer, with
///   the remote destination left partially written
pub async fn put(
    client: &FtpClient,
    signal: &CancelSignal,
    local_path: &str,
    remote_path: &str,
) -> Result<u64> {
    let upload_time = Instant::now();
    signal.check()?;

    let mut conn = client.connect().await?;
    let result = transfer(client, conn.as_mut(), signal, local_path, remote_path).await;
    release(conn.as_mut()).await;
    let copied = result?;

    info!(
        "File {:?} uploaded to {:?} ({} bytes). Time taken {:?}",
        local_path,
        remote_path,
        copied,
        upload_time.elapsed(),
    );
    Ok(copied)
}

async fn transfer(
    client: &FtpClient,
    conn: &mut dyn ServerConnection,
    signal: &CancelSignal,
    local_path: &str,
    remote_path: &str,
) -> Result<u64> {
    signal.check()?;
    let mut local_file = fs::File::open(local_path).await?;
    debug!("Local file opened: {:?}", local_path);

    signal.check()?;
    let mut sink = conn.store(remote_path).await?;
    debug!("Remote file created: {:?}", remote_path);

    signal.check()?;
    let copied = copy(signal, &mut local_file, &mut sink, client.config.io_size).await?;
    sink.shutdown().await?;
    conn.finalize_store(sink).await?;
    Ok(copied)
}
