//! Mock implementations for testing
//!
//! [`MockStorage`] is an in-memory flash volume. Clones share the same
//! volume, so a test can hand one clone to the code under test (even a
//! `'static` fault sink) and inspect the files through another.

#![cfg(any(test, feature = "std"))]

use std::string::String;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use embedded_io::ErrorKind;

use crate::storage::{DirEntry, File, OpenMode, Storage};

/// One call recorded by [`MockStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    /// `mount()`
    Mount,
    /// `open(path, mode)`
    Open(String, OpenMode),
    /// `exists(path)`
    Exists(String),
    /// `remove(path)`
    Remove(String),
    /// `read_dir(dir)`
    ReadDir(String),
}

#[derive(Default)]
struct Volume {
    // Insertion order doubles as the native enumeration order.
    files: Vec<(String, Vec<u8>)>,
    dirs: Vec<String>,
    ops: Vec<MockOp>,
    fail_mount: bool,
    fail_open: bool,
    fail_remove: bool,
    fail_read_dir: bool,
    fail_read_after: Option<usize>,
    qualified_names: bool,
}

impl Volume {
    fn position(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|(p, _)| p == path)
    }
}

/// In-memory flash volume.
#[derive(Clone, Default)]
pub struct MockStorage {
    volume: Arc<Mutex<Volume>>,
}

impl MockStorage {
    /// Create an empty volume.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Volume> {
        self.volume.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add (or replace) a file at the absolute `path`.
    pub fn add_file(&self, path: &str, contents: &[u8]) {
        let mut v = self.lock();
        match v.position(path) {
            Some(i) => {
                if let Some(slot) = v.files.get_mut(i) {
                    slot.1 = contents.to_vec();
                }
            }
            None => v.files.push((path.into(), contents.to_vec())),
        }
    }

    /// Add a sub-directory entry at the absolute `path`.
    pub fn add_dir(&self, path: &str) {
        self.lock().dirs.push(path.into());
    }

    /// Contents of the file at `path`, if present.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let v = self.lock();
        v.position(path).and_then(|i| v.files.get(i)).map(|(_, d)| d.clone())
    }

    /// All file paths, in enumeration order.
    pub fn paths(&self) -> Vec<String> {
        self.lock().files.iter().map(|(p, _)| p.clone()).collect()
    }

    /// Every call made so far.
    pub fn ops(&self) -> Vec<MockOp> {
        self.lock().ops.clone()
    }

    /// Forget recorded calls.
    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// Make `mount()` fail.
    pub fn set_fail_mount(&self, fail: bool) {
        self.lock().fail_mount = fail;
    }

    /// Make every `open()` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Make `remove()` fail.
    pub fn set_fail_remove(&self, fail: bool) {
        self.lock().fail_remove = fail;
    }

    /// Make `read_dir()` fail.
    pub fn set_fail_read_dir(&self, fail: bool) {
        self.lock().fail_read_dir = fail;
    }

    /// Make file reads fail once the cursor reaches `offset` bytes.
    ///
    /// Reads before that point succeed but stop short at `offset`. `None`
    /// turns the fault off.
    pub fn set_fail_read_after(&self, offset: Option<usize>) {
        self.lock().fail_read_after = offset;
    }

    /// Report directory-qualified names from `read_dir()` (`/logs/a.log`
    /// instead of `a.log`).
    pub fn set_qualified_names(&self, qualified: bool) {
        self.lock().qualified_names = qualified;
    }
}

/// Directory part of `path`, including the trailing `/`.
fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => path.get(..=i).unwrap_or(""),
        None => "",
    }
}

fn normalize_dir(dir: &str) -> String {
    let mut d = String::from(dir);
    if !d.starts_with('/') {
        d.insert(0, '/');
    }
    if !d.ends_with('/') {
        d.push('/');
    }
    d
}

impl Storage for MockStorage {
    type Error = ErrorKind;
    type File = MockFile;
    type ReadDir<'a>
        = std::vec::IntoIter<DirEntry>
    where
        Self: 'a;

    fn mount(&mut self) -> Result<(), Self::Error> {
        let mut v = self.lock();
        v.ops.push(MockOp::Mount);
        if v.fail_mount {
            return Err(ErrorKind::Other);
        }
        Ok(())
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error> {
        let mut v = self.lock();
        v.ops.push(MockOp::Open(path.into(), mode));
        if v.fail_open {
            return Err(ErrorKind::Other);
        }
        let exists = v.position(path).is_some();
        match mode {
            OpenMode::Read | OpenMode::Append if !exists => return Err(ErrorKind::NotFound),
            OpenMode::Write => {
                if let Some(i) = v.position(path) {
                    v.files.remove(i);
                }
                v.files.push((path.into(), Vec::new()));
            }
            OpenMode::Read | OpenMode::Append => {}
        }
        Ok(MockFile {
            volume: Arc::clone(&self.volume),
            path: path.into(),
            pos: 0,
        })
    }

    fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        let mut v = self.lock();
        v.ops.push(MockOp::Exists(path.into()));
        Ok(v.position(path).is_some())
    }

    fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        let mut v = self.lock();
        v.ops.push(MockOp::Remove(path.into()));
        if v.fail_remove {
            return Err(ErrorKind::Other);
        }
        let i = v.position(path).ok_or(ErrorKind::NotFound)?;
        v.files.remove(i);
        Ok(())
    }

    fn read_dir(&mut self, dir: &str) -> Result<Self::ReadDir<'_>, Self::Error> {
        let mut v = self.lock();
        v.ops.push(MockOp::ReadDir(dir.into()));
        if v.fail_read_dir {
            return Err(ErrorKind::Other);
        }
        let dir = normalize_dir(dir);
        let qualified = v.qualified_names;
        let name_of = |path: &str| -> Option<String> {
            let rel = path.strip_prefix(dir.as_str())?;
            if rel.is_empty() || rel.contains('/') {
                return None;
            }
            Some(if qualified { path.into() } else { rel.into() })
        };
        let mut entries = Vec::new();
        for d in &v.dirs {
            if let Some(e) = name_of(d.trim_end_matches('/')).and_then(|n| DirEntry::dir(&n)) {
                entries.push(e);
            }
        }
        for (path, _) in &v.files {
            if parent(path) == dir {
                if let Some(e) = name_of(path).and_then(|n| DirEntry::file(&n)) {
                    entries.push(e);
                }
            }
        }
        Ok(entries.into_iter())
    }
}

/// Handle to a file inside a [`MockStorage`] volume.
pub struct MockFile {
    volume: Arc<Mutex<Volume>>,
    path: String,
    pos: usize,
}

impl MockFile {
    fn with_data<R>(&self, f: impl FnOnce(&mut Vec<u8>) -> R) -> Result<R, ErrorKind> {
        let mut v = self.volume.lock().unwrap_or_else(PoisonError::into_inner);
        let i = v.position(&self.path).ok_or(ErrorKind::NotFound)?;
        let (_, data) = v.files.get_mut(i).ok_or(ErrorKind::NotFound)?;
        Ok(f(data))
    }
}

impl embedded_io::ErrorType for MockFile {
    type Error = ErrorKind;
}

impl embedded_io::Read for MockFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let pos = self.pos;
        let limit = self
            .volume
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_read_after;
        let allowed = match limit {
            Some(limit) if pos >= limit => return Err(ErrorKind::Other),
            Some(limit) => limit.saturating_sub(pos),
            None => usize::MAX,
        };
        let n = self.with_data(|data| {
            let rest = data.get(pos..).unwrap_or(&[]);
            let n = rest.len().min(buf.len()).min(allowed);
            if let (Some(dst), Some(src)) = (buf.get_mut(..n), rest.get(..n)) {
                dst.copy_from_slice(src);
            }
            n
        })?;
        self.pos = self.pos.saturating_add(n);
        Ok(n)
    }
}

impl embedded_io::Write for MockFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.with_data(|data| data.extend_from_slice(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl File for MockFile {
    fn size(&self) -> u64 {
        self.with_data(|data| data.len() as u64).unwrap_or(0)
    }

    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}
