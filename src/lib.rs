// Module declarations
mod client;
mod connection;
mod copy;
mod error;
mod memory;
mod operations;
mod signal;
mod transport;
mod types;
mod utils;

// Public API exports
pub use client::FtpClient;
pub use connection::{Dialer, RemoteSink, RemoteSource, ServerConnection};
pub use copy::copy;
pub use error::{CancelReason, FtpError, Result};
pub use memory::{MemoryDialer, MemoryFs};
pub use operations::download::RemoteReader;
pub use signal::CancelSignal;
pub use transport::FtpDialer;
pub use types::{DirEntry, EntryKind, FilterCriteria, FtpClientConfig};
pub use utils::{extension_of, split_leaf, stem};

// Re-export commonly used external types for convenience
pub use tokio_util::sync::CancellationToken;
