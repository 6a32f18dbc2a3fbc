use tracing::debug;

use crate::client::FtpClient;
use crate::error::Result;
use crate::operations::{list, release};
use crate::signal::CancelSignal;
use crate::types::FilterCriteria;
use crate::utils::split_leaf;

/// Size in bytes of a remote file. Fails with `NotFound` if absent.
pub async fn file_size(client: &FtpClient, signal: &CancelSignal, path: &str) -> Result<u64> {
    signal.check()?;
    let mut conn = client.connect().await?;
    debug!("Querying size of {:?}", path);
    let result = conn.file_size(path).await;
    release(conn.as_mut()).await;
    result
}

/// Whether a remote path exists.
///
/// The protocol offers no direct stat, so this lists the parent folder
/// filtered down to the exact leaf name and reports whether anything
/// matched; the cost of an existence check equals a full filtered listing.
/// An empty listing yields `false`, not an error; connect and authentication
/// failures still surface, probed on a dedicated dial before the listing.
pub async fn exists(client: &FtpClient, signal: &CancelSignal, path: &str) -> Result<bool> {
    signal.check()?;

    // The listing swallows connection errors; probe first so they surface.
    let mut conn = client.connect().await?;
    release(conn.as_mut()).await;

    let (folder, leaf) = split_leaf(path);
    let criteria = FilterCriteria::new(Vec::new(), format!("^{}$", regex::escape(leaf)));
    let entries = list::ls(client, signal, folder, &criteria).await;
    Ok(!entries.is_empty())
}
