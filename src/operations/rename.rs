use tracing::debug;

use crate::client::FtpClient;
use crate::error::Result;
use crate::operations::{folder, release};
use crate::signal::CancelSignal;
use crate::utils::split_leaf;

/// Renames a remote file or directory.
///
/// The destination's parent directory chain is created first if it does not
/// exist yet, so a rename into a fresh folder works in one call.
pub async fn rename(
    client: &FtpClient,
    signal: &CancelSignal,
    from: &str,
    to: &str,
) -> Result<()> {
    signal.check()?;

    let (parent, _) = split_leaf(to);
    if !parent.is_empty() {
        folder::ensure_folder(client, signal, parent).await?;
    }

    signal.check()?;
    let mut conn = client.connect().await?;
    debug!("Renaming {:?} to {:?}", from, to);
    let result = conn.rename(from, to).await;
    release(conn.as_mut()).await;
    result
}
