//! Naming / rotation resolver.
//!
//! Works out which file the next crash goes to and which file holds the
//! most recent one, by scanning the configured directory. There is no
//! index file: the directory listing *is* the index, and every resolution
//! re-reads it.
//!
//! The resolved paths are cached in [`ResolvedPaths`] because the capture
//! writer cannot afford a directory scan inside the fault trap. The cache
//! is refreshed on reconfiguration and after a delete, and is otherwise
//! left alone; in particular a capture does not refresh it, because the
//! device resets straight afterwards.

use platform::{DirEntry, Storage};

use crate::config::{CrashPath, MAX_FILE_NUMBER};
use crate::error::CrashLogError;
use crate::naming::{bare_name, NamingConfig};

/// A crash log found in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashFile {
    /// Number parsed from the file name (always >= 1).
    pub number: u32,
    /// Full path of the file.
    pub path: CrashPath,
}

/// Cached result of the last directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Where the next crash record will be appended.
    pub next: CrashPath,
    /// The existing crash log with the highest number, if any.
    pub last: Option<CrashPath>,
}

/// Outcome of one pass over the directory.
#[derive(Debug, Default)]
struct Scan {
    max_number: u32,
    last: Option<CrashPath>,
}

/// Maps the directory contents onto next / last crash-log paths.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: NamingConfig,
    paths: ResolvedPaths,
}

impl Resolver {
    /// Create a resolver. The cached paths are empty until [`Self::refresh`].
    pub fn new(config: NamingConfig) -> Self {
        Self { config, paths: ResolvedPaths::default() }
    }

    /// Active naming configuration.
    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    /// Paths cached by the last refresh.
    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    /// Replace the naming configuration and re-resolve both paths.
    ///
    /// The new config is kept even when the re-scan fails; the cached
    /// paths are then those of an empty directory.
    pub fn reconfigure<S: Storage>(
        &mut self,
        storage: &mut S,
        config: NamingConfig,
    ) -> Result<(), CrashLogError> {
        self.config = config;
        self.refresh(storage)
    }

    /// Re-scan the directory and update the cached paths.
    pub fn refresh<S: Storage>(&mut self, storage: &mut S) -> Result<(), CrashLogError> {
        let scan = self.scan(storage);
        self.paths = ResolvedPaths {
            next: self.config.file_path(next_number(&scan)),
            last: scan.as_ref().ok().and_then(|s| s.last.clone()),
        };
        log_debug!("crash log next: {}", self.paths.next.as_str());
        scan.map(|_| ())
    }

    /// Resolve the next (`find_next`) or last crash-log path.
    ///
    /// With `find_next == false` and no crash log present, this degenerates
    /// to the next path, i.e. the number 1 file.
    pub fn resolve<S: Storage>(
        &self,
        storage: &mut S,
        find_next: bool,
    ) -> Result<CrashPath, CrashLogError> {
        let scan = self.scan(storage)?;
        if !find_next {
            if let Some(last) = scan.last {
                return Ok(last);
            }
        }
        Ok(self.config.file_path(next_after(scan.max_number)))
    }

    /// Number of crash logs in the directory. An unreadable directory counts
    /// as empty.
    pub fn count<S: Storage>(&self, storage: &mut S) -> u32 {
        let n = self.matches(storage).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Lazily iterate over the crash logs in enumeration order.
    ///
    /// Each call starts a fresh directory scan.
    pub fn matches<'a, S: Storage>(&'a self, storage: &'a mut S) -> Matches<'a, S::ReadDir<'a>> {
        let entries = match storage.read_dir(self.config.directory()) {
            Ok(entries) => Some(entries),
            Err(_) => {
                log_warn!("cannot list crash log directory {}", self.config.directory());
                None
            }
        };
        Matches { config: &self.config, entries }
    }

    fn scan<S: Storage>(&self, storage: &mut S) -> Result<Scan, CrashLogError> {
        let entries = storage
            .read_dir(self.config.directory())
            .map_err(|_| CrashLogError::FileSystemUnavailable)?;
        let mut scan = Scan::default();
        for file in entries.filter_map(|e| crash_file(&self.config, &e)) {
            // Ties go to the entry seen last.
            if file.number >= scan.max_number {
                scan.max_number = file.number;
                scan.last = Some(file.path);
            }
        }
        Ok(scan)
    }
}

/// One past the highest number found, or 1 for an empty or unreadable
/// directory.
///
/// `match_name` never yields more than `MAX_FILE_NUMBER`, so the result is
/// always a number no existing file carries.
fn next_number(scan: &Result<Scan, CrashLogError>) -> u32 {
    next_after(scan.as_ref().map_or(0, |s| s.max_number))
}

fn next_after(max: u32) -> u32 {
    max.checked_add(1).unwrap_or(MAX_FILE_NUMBER)
}

fn crash_file(config: &NamingConfig, entry: &DirEntry) -> Option<CrashFile> {
    if !entry.is_file {
        return None;
    }
    match config.match_name(bare_name(&entry.name)) {
        0 => None,
        number => Some(CrashFile { number, path: config.entry_path(&entry.name) }),
    }
}

/// Iterator over the crash logs of one directory scan.
///
/// Returned by [`Resolver::matches`]; yields nothing if the directory could
/// not be listed.
pub struct Matches<'a, D> {
    config: &'a NamingConfig,
    entries: Option<D>,
}

impl<D: Iterator<Item = DirEntry>> Iterator for Matches<'_, D> {
    type Item = CrashFile;

    fn next(&mut self) -> Option<CrashFile> {
        let config = self.config;
        self.entries.as_mut()?.find_map(|e| crash_file(config, &e))
    }
}
