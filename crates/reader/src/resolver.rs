//! Maps caller-supplied file identifiers to readable handles.

use crate::error::{Error, Result};

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::fs::File;
use tokio::io::{self, AsyncRead, AsyncSeek};

/// Opens log files by identifier.
///
/// Implementations own the policy that turns an untrusted identifier into a
/// location; readers never see paths.
#[async_trait]
pub trait LogResolver: Clone + Send + Sync + 'static {
    /// The handle type a read scans. It is owned by a single read and released
    /// when that read ends.
    type Handle: AsyncRead + AsyncSeek + Unpin + Send + 'static;

    /// Opens the log file named `file`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no such file exists.
    async fn open(&self, file: &str) -> Result<Self::Handle>;
}

/// Resolves identifiers to regular files directly inside one directory.
#[derive(Clone, Debug)]
pub struct DirResolver {
    dir: PathBuf,
}

impl DirResolver {
    /// Creates a new `DirResolver` serving files from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory files are served from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Only the final component of the identifier is kept, so `../x` and
    // `/etc/x` both resolve to `x` inside the log directory.
    fn get_file_path(&self, file: &str) -> Option<PathBuf> {
        Path::new(file).file_name().map(|name| self.dir.join(name))
    }
}

#[async_trait]
impl LogResolver for DirResolver {
    type Handle = File;

    async fn open(&self, file: &str) -> Result<File> {
        let path = self
            .get_file_path(file)
            .ok_or_else(|| Error::NotFound(file.to_string()))?;

        let handle = match File::open(&path).await {
            Ok(handle) => handle,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(file.to_string()));
            }
            Err(e) => return Err(Error::Io("error opening log file", e)),
        };

        let metadata = handle
            .metadata()
            .await
            .map_err(|e| Error::Io("error reading log file metadata", e))?;
        if !metadata.is_file() {
            return Err(Error::NotFound(file.to_string()));
        }

        Ok(handle)
    }
}

/// Log files held in memory. Each open sees the contents as they were at that
/// moment.
#[derive(Clone, Debug, Default)]
pub struct MemoryResolver {
    files: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryResolver {
    /// Creates an empty `MemoryResolver`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the file `name`.
    pub fn insert(&self, name: impl Into<String>, contents: impl Into<Bytes>) {
        self.files.write().insert(name.into(), contents.into());
    }

    /// Appends `data` to the file `name`, creating it if needed.
    pub fn append(&self, name: &str, data: &[u8]) {
        let mut files = self.files.write();
        let current = files.get(name).cloned().unwrap_or_default();

        let mut contents = Vec::with_capacity(current.len() + data.len());
        contents.extend_from_slice(&current);
        contents.extend_from_slice(data);

        files.insert(name.to_string(), Bytes::from(contents));
    }

    /// Removes the file `name`.
    pub fn remove(&self, name: &str) {
        self.files.write().remove(name);
    }
}

#[async_trait]
impl LogResolver for MemoryResolver {
    type Handle = Cursor<Bytes>;

    async fn open(&self, file: &str) -> Result<Cursor<Bytes>> {
        self.files
            .read()
            .get(file)
            .cloned()
            .map(Cursor::new)
            .ok_or_else(|| Error::NotFound(file.to_string()))
    }
}
