//! Crash-log configuration and constants
//!
//! All naming defaults and buffer sizes live here rather than being
//! hardcoded at their use sites.

use heapless::String;

pub use platform::PATH_CAPACITY;

/// Directory the crash logs are written to when none is configured.
pub const DEFAULT_DIRECTORY: &str = "/";

/// File name prefix when none is configured.
pub const DEFAULT_PREFIX: &str = "crashLog-";

/// File name suffix when none is configured.
pub const DEFAULT_SUFFIX: &str = ".log";

/// Longest directory, prefix, or suffix accepted by [`crate::NamingConfig`].
pub const FIELD_CAPACITY: usize = 64;

/// Size of the fault-time line buffer.
///
/// The longest line is the register block plus the stack start marker:
/// 83 + 12 = 95 bytes.
pub const LINE_BUFFER_SIZE: usize = 100;

/// Upper bound on the bytes dumped from the faulting stack.
///
/// A corrupted stack pointer can produce an absurd range; dumping it all
/// would outlast the hardware watchdog.
pub const MAX_STACK_DUMP_BYTES: usize = 0x1_0000;

/// Bytes shown per stack dump line (four 32-bit words).
pub const STACK_LINE_BYTES: usize = 16;

/// Chunk size used when copying a log to an output device.
pub const PRINT_CHUNK_SIZE: usize = 64;

/// Highest number a crash log can carry.
///
/// `u32::MAX` is left free so that one past the highest existing file is
/// always a new number.
pub const MAX_FILE_NUMBER: u32 = u32::MAX - 1;

/// Decimal digits in `u32::MAX`.
const MAX_NUMBER_DIGITS: usize = 10;

// Any directory + prefix + number + suffix must fit a path buffer, so
// building a crash-log path can never fail.
const _: () = assert!(3 * FIELD_CAPACITY + MAX_NUMBER_DIGITS <= PATH_CAPACITY);

/// Directory, prefix, or suffix text.
pub type Field = String<FIELD_CAPACITY>;

/// A full crash-log path.
pub type CrashPath = String<PATH_CAPACITY>;
