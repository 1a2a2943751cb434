//! Local filesystem Storage implementation for host tooling.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled (xtask and host tests only).
//! All paths are resolved relative to the `root` provided at construction,
//! so a volume image pulled off the device can be inspected in place.

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::storage::{DirEntry, File, OpenMode, Storage};

/// Error type for local filesystem operations.
#[derive(Debug)]
pub struct LocalStorageError(pub std::io::Error);

impl core::fmt::Display for LocalStorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "local storage error: {}", self.0)
    }
}

impl std::error::Error for LocalStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for LocalStorageError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
}

impl embedded_io::ErrorType for LocalFile {
    type Error = LocalStorageError;
}

impl embedded_io::Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Read::read(&mut self.inner, buf).map_err(LocalStorageError)
    }
}

impl embedded_io::Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Write::write(&mut self.inner, buf).map_err(LocalStorageError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.inner).map_err(LocalStorageError)
    }
}

impl File for LocalFile {
    fn size(&self) -> u64 {
        self.inner.metadata().map(|m| m.len()).unwrap_or(0)
    }

    fn close(mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.inner).map_err(LocalStorageError)
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// Device paths such as `/crashLog-1.log` are mapped beneath `root`; the
/// leading `/` is treated as the volume root, not the host root.
///
/// # Example
/// ```no_run
/// use platform::storage_local::LocalFileStorage;
/// use platform::{OpenMode, Storage};
/// let mut storage = LocalFileStorage::new("/tmp/flash-image");
/// storage.mount().unwrap();
/// let file = storage.open("/crashLog-1.log", OpenMode::Read).unwrap();
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create from the `CRASHLOG_ROOT` environment variable.
    ///
    /// Returns `None` if `CRASHLOG_ROOT` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("CRASHLOG_ROOT").ok().map(Self::new)
    }

    /// Host directory that backs the volume root.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for LocalFileStorage {
    type Error = LocalStorageError;
    type File = LocalFile;
    type ReadDir<'a>
        = std::vec::IntoIter<DirEntry>
    where
        Self: 'a;

    fn mount(&mut self) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.root).map_err(LocalStorageError)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error> {
        let full = self.resolve(path);
        let mut options = fs::OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true),
        };
        let inner = options.open(&full).map_err(LocalStorageError)?;
        Ok(LocalFile { inner })
    }

    fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        Ok(self.resolve(path).is_file())
    }

    fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        fs::remove_file(self.resolve(path)).map_err(LocalStorageError)
    }

    fn read_dir(&mut self, dir: &str) -> Result<Self::ReadDir<'_>, Self::Error> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(dir)).map_err(LocalStorageError)? {
            let entry = entry.map_err(LocalStorageError)?;
            let is_file = entry.file_type().map_err(LocalStorageError)?.is_file();
            // Names that are not UTF-8 or too long cannot belong to us.
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let parsed = if is_file { DirEntry::file(&name) } else { DirEntry::dir(&name) };
            if let Some(parsed) = parsed {
                entries.push(parsed);
            }
        }
        Ok(entries.into_iter())
    }
}
