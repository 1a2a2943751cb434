//! Error type shared by every crash-log operation.

use thiserror_no_std::Error;

/// Why a crash-log operation failed.
///
/// No operation is retried automatically. An error means "check the
/// configuration or the file system", not "try again".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrashLogError {
    /// Mounting the file system, or enumerating its directory, failed.
    #[error("file system unavailable")]
    FileSystemUnavailable,
    /// The target does not name an existing crash log.
    #[error("crash log not found")]
    FileNotFound,
    /// The file exists but a handle could not be acquired.
    #[error("failed to open crash log")]
    OpenFailed,
    /// I/O error while reading.
    #[error("failed to read crash log")]
    ReadFailed,
    /// I/O error while writing, or the delete was refused.
    #[error("failed to write crash log")]
    WriteFailed,
    /// A directory, prefix, or suffix is longer than `FIELD_CAPACITY`.
    #[error("name component too long")]
    NameTooLong,
}
