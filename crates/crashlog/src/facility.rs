//! The crash-log facility: one object owning the file system and the
//! resolver, exposing everything application code needs after a reboot.

use embedded_io::Read as _;
use platform::{File as _, OpenMode, Storage};

use crate::capture;
use crate::config::{CrashPath, PRINT_CHUNK_SIZE};
use crate::error::CrashLogError;
use crate::naming::NamingConfig;
use crate::record::{put, FaultInfo, StackDump};
use crate::resolver::{CrashFile, Matches, Resolver};

/// Which crash log an accessor should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef<'a> {
    /// Crash log by number; 0 means the most recent one.
    Number(u32),
    /// Crash log by full path.
    Path(&'a str),
}

impl From<u32> for FileRef<'_> {
    fn from(number: u32) -> Self {
        Self::Number(number)
    }
}

impl<'a> From<&'a str> for FileRef<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

/// Crash-log storage on a mounted file system.
///
/// Construct it once at startup and wrap it in a
/// [`SharedCrashLog`](crate::SharedCrashLog) before installing it as the
/// fault sink (see [`crate::trap`]), so that the next crash-log path is
/// already known when a fault happens and application code keeps access
/// to the same instance.
///
/// # Example
///
/// ```no_run
/// use crashlog::CrashLog;
/// use platform::mocks::MockStorage;
///
/// let mut log = CrashLog::new(MockStorage::new()).unwrap();
/// for file in log.matches() {
///     let _ = (file.number, file.path);
/// }
/// ```
pub struct CrashLog<S: Storage> {
    storage: S,
    resolver: Resolver,
}

impl<S: Storage> CrashLog<S> {
    /// Mount `storage` and resolve paths with the default naming.
    pub fn new(storage: S) -> Result<Self, CrashLogError> {
        Self::with_config(storage, NamingConfig::default())
    }

    /// Mount `storage` and resolve paths with `config`.
    pub fn with_config(mut storage: S, config: NamingConfig) -> Result<Self, CrashLogError> {
        storage.mount().map_err(|_| {
            log_warn!("crash log file system failed to mount");
            CrashLogError::FileSystemUnavailable
        })?;
        let mut resolver = Resolver::new(config);
        resolver.refresh(&mut storage)?;
        log_info!("crash logs will be written to {}", resolver.paths().next.as_str());
        Ok(Self { storage, resolver })
    }

    /// Change where crash logs live and how they are named.
    ///
    /// Empty arguments fall back to the defaults.
    pub fn configure(
        &mut self,
        directory: &str,
        prefix: &str,
        suffix: &str,
    ) -> Result<(), CrashLogError> {
        let config = NamingConfig::new(directory, prefix, suffix)?;
        self.set_config(config)
    }

    /// Replace the naming configuration and re-resolve the cached paths.
    pub fn set_config(&mut self, config: NamingConfig) -> Result<(), CrashLogError> {
        self.resolver.reconfigure(&mut self.storage, config)
    }

    /// Active naming configuration.
    pub fn config(&self) -> &NamingConfig {
        self.resolver.config()
    }

    /// Configured directory.
    pub fn directory(&self) -> &str {
        self.resolver.config().directory()
    }

    /// Configured file name prefix.
    pub fn prefix(&self) -> &str {
        self.resolver.config().prefix()
    }

    /// Configured file name suffix.
    pub fn suffix(&self) -> &str {
        self.resolver.config().suffix()
    }

    /// Path the next crash record will be appended to.
    pub fn crash_log_path(&self) -> &str {
        &self.resolver.paths().next
    }

    /// Path of the most recent crash log, if there is one.
    pub fn last_crash_log_path(&self) -> Option<&str> {
        self.resolver.paths().last.as_deref()
    }

    /// Number of crash logs currently on the file system.
    pub fn count(&mut self) -> u32 {
        self.resolver.count(&mut self.storage)
    }

    /// Iterate over the crash logs in file-system order.
    pub fn matches(&mut self) -> Matches<'_, S::ReadDir<'_>> {
        self.resolver.matches(&mut self.storage)
    }

    /// Call `f(number, path)` for every crash log.
    pub fn for_each_match(&mut self, mut f: impl FnMut(u32, &str)) {
        for CrashFile { number, path } in self.matches() {
            f(number, &path);
        }
    }

    /// Copy a crash log into `buf`.
    ///
    /// `buf` is cleared first: on any failure it holds an empty,
    /// NUL-terminated string. On success returns the number of bytes copied,
    /// which is capped at `buf.len()`; the byte after the copied content is
    /// set to NUL when there is room for it.
    pub fn read_file<'r>(
        &mut self,
        file: impl Into<FileRef<'r>>,
        buf: &mut [u8],
    ) -> Result<usize, CrashLogError> {
        if let Some(first) = buf.first_mut() {
            *first = 0;
        }
        let path = self.target(file.into())?;
        let mut handle = self.open_existing(&path)?;
        let mut filled = 0usize;
        while let Some(rest) = buf.get_mut(filled..).filter(|r| !r.is_empty()) {
            match handle.read(rest) {
                Ok(0) => break,
                Ok(n) => filled = filled.saturating_add(n),
                Err(_) => {
                    if let Some(first) = buf.first_mut() {
                        *first = 0;
                    }
                    return Err(CrashLogError::ReadFailed);
                }
            }
        }
        let _ = handle.close();
        if let Some(end) = buf.get_mut(filled) {
            *end = 0;
        }
        Ok(filled)
    }

    /// Copy a crash log byte-for-byte to `out`. Returns the bytes written.
    pub fn print_file<'r, W: embedded_io::Write>(
        &mut self,
        file: impl Into<FileRef<'r>>,
        out: &mut W,
    ) -> Result<usize, CrashLogError> {
        let path = self.target(file.into())?;
        let mut handle = self.open_existing(&path)?;
        let mut chunk = [0u8; PRINT_CHUNK_SIZE];
        let mut total = 0usize;
        loop {
            let n = handle.read(&mut chunk).map_err(|_| CrashLogError::ReadFailed)?;
            let Some(data) = chunk.get(..n).filter(|d| !d.is_empty()) else {
                break;
            };
            if !put(out, data) {
                return Err(CrashLogError::WriteFailed);
            }
            total = total.saturating_add(n);
        }
        let _ = handle.close();
        Ok(total)
    }

    /// Delete crash log `number` (0 = the most recent one).
    ///
    /// The cached paths are re-resolved afterwards, since the next and last
    /// crash logs may have changed.
    pub fn remove_file(&mut self, number: u32) -> Result<(), CrashLogError> {
        let path = self.target(FileRef::Number(number))?;
        let exists = self
            .storage
            .exists(&path)
            .map_err(|_| CrashLogError::FileSystemUnavailable)?;
        if !exists {
            return Err(CrashLogError::FileNotFound);
        }
        let removed = self.storage.remove(&path).map_err(|_| CrashLogError::WriteFailed);
        let refreshed = self.resolver.refresh(&mut self.storage);
        removed?;
        log_info!("removed crash log {}", path.as_str());
        refreshed
    }

    /// Append a crash record to the cached next path.
    ///
    /// Safe to call from the fault trap: no directory scan, no allocation,
    /// and failures are swallowed. The cached paths are deliberately not
    /// refreshed.
    pub fn capture(&mut self, fault: &FaultInfo, stack: &StackDump<'_>) {
        capture::capture(&mut self.storage, &self.resolver.paths().next, fault, stack);
    }

    /// Re-scan the directory, e.g. after files were changed behind our back.
    pub fn refresh(&mut self) -> Result<(), CrashLogError> {
        self.resolver.refresh(&mut self.storage)
    }

    /// The underlying file system.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The underlying file system, mutably.
    ///
    /// Cached paths are not refreshed after changes made through this; call
    /// [`Self::refresh`].
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Give back the file system.
    pub fn into_inner(self) -> S {
        self.storage
    }

    fn target(&self, file: FileRef<'_>) -> Result<CrashPath, CrashLogError> {
        match file {
            FileRef::Number(0) => self
                .resolver
                .paths()
                .last
                .clone()
                .ok_or(CrashLogError::FileNotFound),
            FileRef::Number(n) => Ok(self.resolver.config().file_path(n)),
            FileRef::Path(p) => {
                let mut path = CrashPath::new();
                path.push_str(p).map_err(|_| CrashLogError::NameTooLong)?;
                Ok(path)
            }
        }
    }

    /// Mount, check existence, then open for reading.
    fn open_existing(&mut self, path: &str) -> Result<S::File, CrashLogError> {
        self.storage.mount().map_err(|_| CrashLogError::FileSystemUnavailable)?;
        match self.storage.exists(path) {
            Ok(true) => {}
            Ok(false) => return Err(CrashLogError::FileNotFound),
            Err(_) => return Err(CrashLogError::FileSystemUnavailable),
        }
        self.storage.open(path, OpenMode::Read).map_err(|_| {
            log_warn!("cannot open crash log {}", path);
            CrashLogError::OpenFailed
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use platform::mocks::MockStorage;

    #[test]
    fn mount_failure_is_reported() {
        let fs = MockStorage::new();
        fs.set_fail_mount(true);
        assert_eq!(CrashLog::new(fs).err(), Some(CrashLogError::FileSystemUnavailable));
    }

    #[test]
    fn paths_are_resolved_at_construction() {
        let fs = MockStorage::new();
        fs.add_file("/crashLog-4.log", b"");
        let log = CrashLog::new(fs).unwrap();
        assert_eq!(log.crash_log_path(), "/crashLog-5.log");
        assert_eq!(log.last_crash_log_path(), Some("/crashLog-4.log"));
    }

    #[test]
    fn target_by_path_too_long() {
        let mut log = CrashLog::new(MockStorage::new()).unwrap();
        let long = "a".repeat(crate::config::PATH_CAPACITY + 1);
        let mut buf = [0u8; 4];
        assert_eq!(log.read_file(long.as_str(), &mut buf), Err(CrashLogError::NameTooLong));
    }

    #[test]
    fn open_failure_is_open_failed() {
        let fs = MockStorage::new();
        fs.add_file("/crashLog-1.log", b"x");
        let mut log = CrashLog::new(fs.clone()).unwrap();
        fs.set_fail_open(true);
        let mut buf = [0u8; 4];
        assert_eq!(log.read_file(1u32, &mut buf), Err(CrashLogError::OpenFailed));
    }

    #[test]
    fn remove_failure_still_refreshes() {
        let fs = MockStorage::new();
        fs.add_file("/crashLog-1.log", b"x");
        let mut log = CrashLog::new(fs.clone()).unwrap();
        fs.set_fail_remove(true);
        fs.clear_ops();
        assert_eq!(log.remove_file(1), Err(CrashLogError::WriteFailed));
        assert!(fs.ops().iter().any(|op| matches!(op, platform::mocks::MockOp::ReadDir(_))));
        assert_eq!(log.last_crash_log_path(), Some("/crashLog-1.log"));
    }
}
