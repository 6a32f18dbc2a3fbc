use std::time::Duration;

use async_trait::async_trait;
use suppaftp::list::File as RemoteListEntry;
use suppaftp::types::FileType as WireFileType;
use suppaftp::{AsyncFtpStream, FtpError as WireError, Status};
use tokio_util::compat::{
    FuturesAsyncReadCompatExt, FuturesAsyncWriteCompatExt, TokioAsyncReadCompatExt,
    TokioAsyncWriteCompatExt,
};
use tracing::debug;

use crate::connection::{Dialer, RemoteSink, RemoteSource, ServerConnection};
use crate::error::{FtpError, Result};
use crate::types::{DirEntry, EntryKind};

/// Dials real FTP servers.
pub struct FtpDialer;

impl FtpDialer {
    async fn open(addr: &str) -> Result<Box<dyn ServerConnection>> {
        let stream = AsyncFtpStream::connect(addr).await.map_err(connect_error)?;
        debug!("Dialed {:?}", addr);
        Ok(Box::new(FtpServerConnection { stream }))
    }
}

#[async_trait]
impl Dialer for FtpDialer {
    async fn dial(&self, addr: &str) -> Result<Box<dyn ServerConnection>> {
        FtpDialer::open(addr).await
    }

    async fn dial_timeout(
        &self,
        addr: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ServerConnection>> {
        match tokio::time::timeout(timeout, FtpDialer::open(addr)).await {
            Ok(result) => result,
            Err(_) => Err(FtpError::Connect(format!(
                "dial of {addr} timed out after {timeout:?}"
            ))),
        }
    }
}

/// FTP-backed connection. One control channel, one transfer at a time, quit
/// after use; the client never reuses these across operations.
struct FtpServerConnection {
    stream: AsyncFtpStream,
}

#[async_trait]
impl ServerConnection for FtpServerConnection {
    async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.stream
            .login(username, password)
            .await
            .map_err(|err| FtpError::Auth(err.to_string()))?;
        // Everything this client moves is binary.
        self.stream
            .transfer_type(WireFileType::Binary)
            .await
            .map_err(wire_error)
    }

    async fn retrieve(&mut self, path: &str) -> Result<RemoteSource> {
        let source = self
            .stream
            .retr_as_stream(path)
            .await
            .map_err(|err| path_error(err, path))?;
        Ok(Box::new(source.compat()))
    }

    async fn finalize_retrieve(&mut self, source: RemoteSource) -> Result<()> {
        self.stream
            .finalize_retr_stream(source.compat())
            .await
            .map_err(wire_error)
    }

    async fn store(&mut self, path: &str) -> Result<RemoteSink> {
        let sink = self
            .stream
            .put_with_stream(path)
            .await
            .map_err(|err| path_error(err, path))?;
        Ok(Box::new(sink.compat_write()))
    }

    async fn finalize_store(&mut self, sink: RemoteSink) -> Result<()> {
        self.stream
            .finalize_put_stream(sink.compat_write())
            .await
            .map_err(wire_error)
    }

    async fn delete(&mut self, path: &str) -> Result<()> {
        self.stream
            .rm(path)
            .await
            .map_err(|err| path_error(err, path))
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        self.stream
            .rename(from, to)
            .await
            .map_err(|err| path_error(err, from))
    }

    async fn make_dir(&mut self, path: &str) -> Result<()> {
        self.stream
            .mkdir(path)
            .await
            .map_err(|err| path_error(err, path))
    }

    async fn remove_dir(&mut self, path: &str) -> Result<()> {
        self.stream
            .rmdir(path)
            .await
            .map_err(|err| path_error(err, path))
    }

    async fn remove_dir_all(&mut self, path: &str) -> Result<()> {
        // Depth-first: clear a directory's files, descend into its
        // subdirectories, remove the directory itself once empty. Parents
        // are re-listed after their children disappear.
        let mut stack = vec![path.to_string()];
        while let Some(dir) = stack.last().cloned() {
            let entries = self.list(&dir).await?;
            let mut subdirs = Vec::new();
            for entry in entries {
                if entry.name == "." || entry.name == ".." {
                    continue;
                }
                let child = join_path(&dir, &entry.name);
                match entry.kind {
                    EntryKind::Directory => subdirs.push(child),
                    _ => self.delete(&child).await?,
                }
            }
            if subdirs.is_empty() {
                self.remove_dir(&dir).await?;
                stack.pop();
            } else {
                stack.extend(subdirs);
            }
        }
        Ok(())
    }

    async fn file_size(&mut self, path: &str) -> Result<u64> {
        let size = self
            .stream
            .size(path)
            .await
            .map_err(|err| path_error(err, path))?;
        Ok(size as u64)
    }

    async fn list(&mut self, path: &str) -> Result<Vec<DirEntry>> {
        let target = if path.is_empty() { None } else { Some(path) };
        let lines = self
            .stream
            .list(target)
            .await
            .map_err(|err| path_error(err, path))?;

        let mut entries = Vec::with_capacity(lines.len());
        for line in &lines {
            match RemoteListEntry::try_from(line.as_str()) {
                Ok(file) => entries.push(to_entry(&file)),
                Err(err) => debug!("Skipping unparsable listing line {:?}: {}", line, err),
            }
        }
        Ok(entries)
    }

    async fn quit(&mut self) -> Result<()> {
        self.stream.quit().await.map_err(wire_error)
    }
}

fn to_entry(file: &RemoteListEntry) -> DirEntry {
    let kind = if file.is_directory() {
        EntryKind::Directory
    } else if file.is_symlink() {
        EntryKind::Symlink
    } else {
        EntryKind::File
    };
    DirEntry {
        name: file.name().to_string(),
        kind,
        size: file.size() as u64,
        modified: Some(file.modified()),
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

fn connect_error(err: WireError) -> FtpError {
    FtpError::Connect(err.to_string())
}

/// Server responses in the 550 family mean the path does not exist (or is
/// not accessible); everything else stays a protocol error.
fn path_error(err: WireError, path: &str) -> FtpError {
    match &err {
        WireError::UnexpectedResponse(response)
            if response.status == Status::FileUnavailable =>
        {
            FtpError::NotFound(path.to_string())
        }
        _ => FtpError::Protocol(err.to_string()),
    }
}

fn wire_error(err: WireError) -> FtpError {
    FtpError::Protocol(err.to_string())
}
