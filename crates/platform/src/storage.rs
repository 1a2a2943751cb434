//! Storage abstraction for flash file systems
//!
//! The traits here are blocking on purpose. The crash capture path runs
//! inside the fault trap, where no executor is available and every call
//! must return before the hardware watchdog fires.

use heapless::String;

/// Longest path (directory + file name) a [`DirEntry`] can carry.
///
/// LittleFS and SPIFFS both cap names well below this.
pub const PATH_CAPACITY: usize = 256;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read from the start. Fails if the file does not exist.
    Read,
    /// Create the file, or truncate it if it already exists.
    Write,
    /// Append to the end. Fails if the file does not exist.
    Append,
}

/// One entry produced by [`Storage::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name as the file system reports it.
    ///
    /// Some backends report a bare name (`crashLog-1.log`), others qualify
    /// it with the directory (`/logs/crashLog-1.log`). Consumers must not
    /// assume either form.
    pub name: String<PATH_CAPACITY>,
    /// `false` for directories and other non-file entries.
    pub is_file: bool,
}

impl DirEntry {
    /// Build a file entry. Returns `None` if `name` exceeds [`PATH_CAPACITY`].
    pub fn file(name: &str) -> Option<Self> {
        Self::new(name, true)
    }

    /// Build a directory entry. Returns `None` if `name` exceeds [`PATH_CAPACITY`].
    pub fn dir(name: &str) -> Option<Self> {
        Self::new(name, false)
    }

    fn new(name: &str, is_file: bool) -> Option<Self> {
        let mut owned = String::new();
        owned.push_str(name).ok()?;
        Some(Self { name: owned, is_file })
    }
}

/// Storage trait for file system access
pub trait Storage {
    /// Error type
    type Error: embedded_io::Error;
    /// File type
    type File: File<Error = Self::Error>;
    /// Directory listing, in the file system's native order (not sorted).
    type ReadDir<'a>: Iterator<Item = DirEntry>
    where
        Self: 'a;

    /// Mount / begin the file system. Calling it on a mounted volume is a no-op.
    fn mount(&mut self) -> Result<(), Self::Error>;

    /// Open `path` in `mode`.
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error>;

    /// Check if path exists
    fn exists(&mut self, path: &str) -> Result<bool, Self::Error>;

    /// Delete the file at `path`.
    fn remove(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Enumerate the entries of directory `dir`.
    fn read_dir(&mut self, dir: &str) -> Result<Self::ReadDir<'_>, Self::Error>;
}

/// An open file handle.
pub trait File: embedded_io::Read + embedded_io::Write {
    /// Current file size in bytes.
    fn size(&self) -> u64;

    /// Flush and release the handle.
    fn close(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}
