//! In-memory implementation of the connection capability, used by the test
//! suite and the offline demo. Supports every method a real connection does,
//! plus fault injection and dial/quit accounting so tests can assert the
//! exactly-once release invariant.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::connection::{Dialer, RemoteSink, RemoteSource, ServerConnection};
use crate::error::{FtpError, Result};
use crate::types::{DirEntry, EntryKind};
use crate::utils::split_leaf;

#[derive(Default)]
struct FsState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    /// Raw entries surfaced verbatim by listings, keyed by folder. Lets
    /// tests inject symlinks and other kinds a derived listing never yields.
    extra_entries: Vec<(String, DirEntry)>,
    credentials: Option<(String, String)>,
    refuse_dials: bool,
    fail_listings: bool,
    dials: usize,
    quits: usize,
}

/// Shared fake file store behind [`MemoryDialer`] connections.
///
/// Paths are `/`-separated and normalized without surrounding slashes; the
/// root folder is the empty string. Listings synthesize the `.` and `..`
/// entries the way real servers do.
#[derive(Clone, Default)]
pub struct MemoryFs {
    inner: Arc<Mutex<FsState>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file. Parent directories are not created implicitly.
    pub fn insert_file(&self, path: &str, data: &[u8]) {
        let mut state = self.inner.lock().unwrap();
        state.files.insert(norm(path), data.to_vec());
    }

    pub fn insert_dir(&self, path: &str) {
        let mut state = self.inner.lock().unwrap();
        state.dirs.insert(norm(path));
    }

    /// Injects a raw listing entry under `folder`, bypassing derivation.
    pub fn insert_entry(&self, folder: &str, entry: DirEntry) {
        let mut state = self.inner.lock().unwrap();
        state.extra_entries.push((norm(folder), entry));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().files.get(&norm(path)).cloned()
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.inner.lock().unwrap().files.contains_key(&norm(path))
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.inner.lock().unwrap().dirs.contains(&norm(path))
    }

    /// Requires this exact username/password pair on login.
    pub fn set_credentials(&self, username: &str, password: &str) {
        let mut state = self.inner.lock().unwrap();
        state.credentials = Some((username.to_string(), password.to_string()));
    }

    /// Makes every subsequent dial fail with a connect error.
    pub fn refuse_dials(&self) {
        self.inner.lock().unwrap().refuse_dials = true;
    }

    /// Makes every subsequent listing fetch fail.
    pub fn fail_listings(&self) {
        self.inner.lock().unwrap().fail_listings = true;
    }

    /// Number of successful dials so far.
    pub fn dials(&self) -> usize {
        self.inner.lock().unwrap().dials
    }

    /// Number of connection releases so far.
    pub fn quits(&self) -> usize {
        self.inner.lock().unwrap().quits
    }

    fn list_folder(&self, folder: &str) -> Result<Vec<DirEntry>> {
        let state = self.inner.lock().unwrap();
        if state.fail_listings {
            return Err(FtpError::Protocol("listing fetch failed".to_string()));
        }

        let folder = norm(folder);
        let mut entries = vec![synthetic_dir("."), synthetic_dir("..")];
        for dir in &state.dirs {
            let (parent, leaf) = split_leaf(dir);
            if parent == folder {
                entries.push(DirEntry {
                    name: leaf.to_string(),
                    kind: EntryKind::Directory,
                    size: 0,
                    modified: Some(SystemTime::now()),
                });
            }
        }
        for (path, data) in &state.files {
            let (parent, leaf) = split_leaf(path);
            if parent == folder {
                entries.push(DirEntry {
                    name: leaf.to_string(),
                    kind: EntryKind::File,
                    size: data.len() as u64,
                    modified: Some(SystemTime::now()),
                });
            }
        }
        for (parent, entry) in &state.extra_entries {
            if *parent == folder {
                entries.push(entry.clone());
            }
        }
        Ok(entries)
    }
}

fn norm(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn synthetic_dir(name: &str) -> DirEntry {
    DirEntry {
        name: name.to_string(),
        kind: EntryKind::Directory,
        size: 0,
        modified: None,
    }
}

/// Dialer handing out connections onto a shared [`MemoryFs`].
pub struct MemoryDialer {
    fs: MemoryFs,
}

impl MemoryDialer {
    pub fn new(fs: MemoryFs) -> Self {
        Self { fs }
    }

    fn open(&self) -> Result<Box<dyn ServerConnection>> {
        let mut state = self.fs.inner.lock().unwrap();
        if state.refuse_dials {
            return Err(FtpError::Connect("connection refused".to_string()));
        }
        state.dials += 1;
        drop(state);
        Ok(Box::new(MemoryConnection {
            fs: self.fs.clone(),
            released: false,
        }))
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, _addr: &str) -> Result<Box<dyn ServerConnection>> {
        self.open()
    }

    async fn dial_timeout(
        &self,
        addr: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn ServerConnection>> {
        self.dial(addr).await
    }
}

struct MemoryConnection {
    fs: MemoryFs,
    released: bool,
}

#[async_trait]
impl ServerConnection for MemoryConnection {
    async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let state = self.fs.inner.lock().unwrap();
        match &state.credentials {
            Some((user, pass)) if user != username || pass != password => {
                Err(FtpError::Auth(format!("login rejected for {username:?}")))
            }
            _ => Ok(()),
        }
    }

    async fn retrieve(&mut self, path: &str) -> Result<RemoteSource> {
        let state = self.fs.inner.lock().unwrap();
        match state.files.get(&norm(path)) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(FtpError::NotFound(path.to_string())),
        }
    }

    async fn finalize_retrieve(&mut self, _source: RemoteSource) -> Result<()> {
        Ok(())
    }

    async fn store(&mut self, path: &str) -> Result<RemoteSink> {
        let path = norm(path);
        let mut state = self.fs.inner.lock().unwrap();
        let (parent, _) = split_leaf(&path);
        if !parent.is_empty() && !state.dirs.contains(parent) {
            return Err(FtpError::Protocol(format!("no such directory: {parent}")));
        }
        // Create or truncate; bytes land as the sink writes them, so a
        // cancelled upload leaves the partial content behind.
        state.files.insert(path.clone(), Vec::new());
        Ok(Box::new(MemorySink { fs: self.fs.clone(), path }))
    }

    async fn finalize_store(&mut self, _sink: RemoteSink) -> Result<()> {
        Ok(())
    }

    async fn delete(&mut self, path: &str) -> Result<()> {
        let mut state = self.fs.inner.lock().unwrap();
        match state.files.remove(&norm(path)) {
            Some(_) => Ok(()),
            None => Err(FtpError::NotFound(path.to_string())),
        }
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let from = norm(from);
        let to = norm(to);
        let mut state = self.fs.inner.lock().unwrap();

        if let Some(data) = state.files.remove(&from) {
            state.files.insert(to, data);
            return Ok(());
        }
        if state.dirs.remove(&from) {
            state.dirs.insert(to.clone());
            let prefix = format!("{from}/");
            let moved: Vec<(String, String)> = state
                .files
                .keys()
                .filter(|key| key.starts_with(&prefix))
                .map(|key| (key.clone(), format!("{to}/{}", &key[prefix.len()..])))
                .collect();
            for (old, new) in moved {
                if let Some(data) = state.files.remove(&old) {
                    state.files.insert(new, data);
                }
            }
            let subdirs: Vec<String> = state
                .dirs
                .iter()
                .filter(|dir| dir.starts_with(&prefix))
                .cloned()
                .collect();
            for old in subdirs {
                state.dirs.remove(&old);
                state.dirs.insert(format!("{to}/{}", &old[prefix.len()..]));
            }
            return Ok(());
        }
        Err(FtpError::NotFound(from))
    }

    async fn make_dir(&mut self, path: &str) -> Result<()> {
        let path = norm(path);
        let mut state = self.fs.inner.lock().unwrap();
        if state.dirs.contains(&path) || state.files.contains_key(&path) {
            return Err(FtpError::Protocol(format!("already exists: {path}")));
        }
        let (parent, _) = split_leaf(&path);
        if !parent.is_empty() && !state.dirs.contains(parent) {
            return Err(FtpError::Protocol(format!("no such directory: {parent}")));
        }
        state.dirs.insert(path);
        Ok(())
    }

    async fn remove_dir(&mut self, path: &str) -> Result<()> {
        let path = norm(path);
        let mut state = self.fs.inner.lock().unwrap();
        if !state.dirs.contains(&path) {
            return Err(FtpError::NotFound(path));
        }
        let prefix = format!("{path}/");
        let occupied = state.files.keys().any(|key| key.starts_with(&prefix))
            || state.dirs.iter().any(|dir| dir.starts_with(&prefix));
        if occupied {
            return Err(FtpError::Protocol(format!("directory not empty: {path}")));
        }
        state.dirs.remove(&path);
        Ok(())
    }

    async fn remove_dir_all(&mut self, path: &str) -> Result<()> {
        let path = norm(path);
        let mut state = self.fs.inner.lock().unwrap();
        if !state.dirs.contains(&path) {
            return Err(FtpError::NotFound(path));
        }
        let prefix = format!("{path}/");
        state.files.retain(|key, _| !key.starts_with(&prefix));
        state.dirs.retain(|dir| !dir.starts_with(&prefix) && *dir != path);
        Ok(())
    }

    async fn file_size(&mut self, path: &str) -> Result<u64> {
        let state = self.fs.inner.lock().unwrap();
        match state.files.get(&norm(path)) {
            Some(data) => Ok(data.len() as u64),
            None => Err(FtpError::NotFound(path.to_string())),
        }
    }

    async fn list(&mut self, path: &str) -> Result<Vec<DirEntry>> {
        self.fs.list_folder(path)
    }

    async fn quit(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.fs.inner.lock().unwrap().quits += 1;
        }
        Ok(())
    }
}

/// Append-only sink backing [`ServerConnection::store`]; every write lands
/// in the shared store immediately.
struct MemorySink {
    fs: MemoryFs,
    path: String,
}

impl tokio::io::AsyncWrite for MemorySink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let mut state = self.fs.inner.lock().unwrap();
        match state.files.get_mut(&self.path) {
            Some(data) => {
                data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            None => Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("remote file vanished: {}", self.path),
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_is_derived_per_folder() {
        let fs = MemoryFs::new();
        fs.insert_dir("in");
        fs.insert_file("in/a.json", b"{}");
        fs.insert_file("other/b.json", b"{}");

        let mut conn = MemoryDialer::new(fs).open().unwrap();
        let entries = conn.list("in").await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".", "..", "a.json"]);
    }

    #[tokio::test]
    async fn rename_moves_a_directory_subtree() {
        let fs = MemoryFs::new();
        fs.insert_dir("old");
        fs.insert_dir("old/sub");
        fs.insert_file("old/a.bin", b"a");
        fs.insert_file("old/sub/b.bin", b"b");

        let mut conn = MemoryDialer::new(fs.clone()).open().unwrap();
        conn.rename("old", "new").await.unwrap();
        assert!(fs.has_dir("new"));
        assert!(fs.has_dir("new/sub"));
        assert!(fs.has_file("new/a.bin"));
        assert!(fs.has_file("new/sub/b.bin"));
        assert!(!fs.has_dir("old"));
        assert!(!fs.has_file("old/a.bin"));
    }

    #[tokio::test]
    async fn quit_is_idempotent_per_connection() {
        let fs = MemoryFs::new();
        let mut conn = MemoryDialer::new(fs.clone()).open().unwrap();
        conn.quit().await.unwrap();
        conn.quit().await.unwrap();
        assert_eq!(fs.quits(), 1);
    }
}
