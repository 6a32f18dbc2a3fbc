use tracing::warn;

use crate::connection::ServerConnection;

/// Module for downloading files from remote server
pub(crate) mod download;

/// Module for directory creation and assurance
pub(crate) mod folder;

/// Module for listing remote directory contents
pub(crate) mod list;

/// Module for removing remote files and directories
pub(crate) mod remove;

/// Module for renaming remote paths
pub(crate) mod rename;

/// Module for size and existence queries
pub(crate) mod stat;

/// Module for uploading files to remote server
pub(crate) mod upload;

/// Releases a connection, logging instead of failing: by the time a release
/// happens the operation's own outcome is already decided.
pub(crate) async fn release(conn: &mut dyn ServerConnection) {
    if let Err(err) = conn.quit().await {
        warn!("Failed to release connection: {}", err);
    }
}
