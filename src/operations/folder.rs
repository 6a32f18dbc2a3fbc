use futures::future::BoxFuture;
use tracing::debug;

use crate::client::FtpClient;
use crate::error::Result;
use crate::operations::{release, stat};
use crate::signal::CancelSignal;
use crate::utils::split_leaf;

/// Creates a single remote directory. The parent must already exist.
pub async fn make_dir(client: &FtpClient, signal: &CancelSignal, path: &str) -> Result<()> {
    signal.check()?;
    let mut conn = client.connect().await?;
    debug!("Creating directory {:?}", path);
    let result = conn.make_dir(path).await;
    release(conn.as_mut()).await;
    result
}

/// Ensures `path` and its whole parent chain exist, creating missing
/// segments top-down (the remote equivalent of `mkdir -p`).
///
/// No coordination primitive guards concurrent callers, so creation racing
/// another operation is expected: when a create fails but the directory turns
/// out to exist afterwards, that counts as success.
pub fn ensure_folder<'a>(
    client: &'a FtpClient,
    signal: &'a CancelSignal,
    path: &'a str,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        if path.is_empty() {
            return Ok(());
        }
        signal.check()?;

        if stat::exists(client, signal, path).await? {
            return Ok(());
        }

        let (parent, _) = split_leaf(path);
        if !parent.is_empty() {
            ensure_folder(client, signal, parent).await?;
        }

        match make_dir(client, signal, path).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // A concurrent creator may have won the race.
                if stat::exists(client, signal, path).await? {
                    debug!("Directory {:?} already created concurrently", path);
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    })
}
