use tracing::debug;

use crate::client::FtpClient;
use crate::error::Result;
use crate::operations::release;
use crate::signal::CancelSignal;

/// Removes a remote file. Absence is an error, not a no-op.
pub async fn remove(client: &FtpClient, signal: &CancelSignal, path: &str) -> Result<()> {
    signal.check()?;
    let mut conn = client.connect().await?;
    debug!("Removing {:?}", path);
    let result = conn.delete(path).await;
    release(conn.as_mut()).await;
    result
}

/// Removes an empty remote directory.
pub async fn remove_dir(client: &FtpClient, signal: &CancelSignal, path: &str) -> Result<()> {
    signal.check()?;
    let mut conn = client.connect().await?;
    debug!("Removing directory {:?}", path);
    let result = conn.remove_dir(path).await;
    release(conn.as_mut()).await;
    result
}

/// Removes a remote directory and everything below it.
pub async fn remove_dir_all(client: &FtpClient, signal: &CancelSignal, path: &str) -> Result<()> {
    signal.check()?;
    let mut conn = client.connect().await?;
    debug!("Removing directory tree {:?}", path);
    let result = conn.remove_dir_all(path).await;
    release(conn.as_mut()).await;
    result
}
