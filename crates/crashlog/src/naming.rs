//! Crash-log file naming.
//!
//! A crash log is any file in the configured directory named
//! `<prefix><decimal number><suffix>`. The number is the file's identity:
//! [`NamingConfig::file_path`] maps a number to a path and
//! [`NamingConfig::match_name`] maps a bare name back to its number.
//!
//! Number 0 is never assigned to a file. It is returned for names that do
//! not match, so a file literally named `crashLog-0.log` is invisible.

use core::fmt::Write as _;

use crate::config::{
    CrashPath, Field, DEFAULT_DIRECTORY, DEFAULT_PREFIX, DEFAULT_SUFFIX, MAX_FILE_NUMBER,
};
use crate::error::CrashLogError;

/// Where crash logs live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamingConfig {
    directory: Field,
    prefix: Field,
    suffix: Field,
}

impl NamingConfig {
    /// Build a config. Empty arguments fall back to the defaults
    /// (`"/"`, `"crashLog-"`, `".log"`).
    ///
    /// The directory is used verbatim as the path prefix, so it should end
    /// with `/`.
    pub fn new(directory: &str, prefix: &str, suffix: &str) -> Result<Self, CrashLogError> {
        Ok(Self {
            directory: field(directory, DEFAULT_DIRECTORY)?,
            prefix: field(prefix, DEFAULT_PREFIX)?,
            suffix: field(suffix, DEFAULT_SUFFIX)?,
        })
    }

    /// Directory the crash logs are written to.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// File name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// File name suffix.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Number of the crash log called `name`, or 0 if `name` is not one.
    ///
    /// `name` must be a bare file name without any directory part. The text
    /// between prefix and suffix is parsed like C `strtol`: leading digits
    /// are taken, parsing stops at the first non-digit, and no digits at all
    /// yields 0. A number above [`MAX_FILE_NUMBER`] is treated as no match.
    pub fn match_name(&self, name: &str) -> u32 {
        name.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .map_or(0, parse_leading_digits)
    }

    /// Path of crash log number `number`:
    /// `directory + prefix + number + suffix`.
    pub fn file_path(&self, number: u32) -> CrashPath {
        let mut path = CrashPath::new();
        // Cannot overflow: field sizes are checked against PATH_CAPACITY in config.
        let _ = write!(path, "{}{}{}{}", self.directory, self.prefix, number, self.suffix);
        path
    }

    /// Full path for a directory entry whose reported name is `entry_name`.
    ///
    /// Qualified names are kept as reported; bare names are joined to the
    /// configured directory.
    pub fn entry_path(&self, entry_name: &str) -> CrashPath {
        let mut path = CrashPath::new();
        if entry_name.contains('/') {
            let _ = path.push_str(entry_name);
        } else {
            let _ = write!(path, "{}{}", self.directory, entry_name);
        }
        path
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            directory: default_field(DEFAULT_DIRECTORY),
            prefix: default_field(DEFAULT_PREFIX),
            suffix: default_field(DEFAULT_SUFFIX),
        }
    }
}

/// The component after the last `/` of a directory entry name.
pub fn bare_name(entry_name: &str) -> &str {
    entry_name.rsplit('/').next().unwrap_or(entry_name)
}

fn field(value: &str, default: &str) -> Result<Field, CrashLogError> {
    let value = if value.is_empty() { default } else { value };
    let mut out = Field::new();
    out.push_str(value).map_err(|_| CrashLogError::NameTooLong)?;
    Ok(out)
}

fn default_field(value: &str) -> Field {
    let mut out = Field::new();
    // Defaults are a handful of bytes.
    let _ = out.push_str(value);
    out
}

fn parse_leading_digits(text: &str) -> u32 {
    let mut value: u32 = 0;
    for b in text.bytes().take_while(u8::is_ascii_digit) {
        let digit = u32::from(b.wrapping_sub(b'0'));
        match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(v) => value = v,
            None => return 0,
        }
    }
    if value > MAX_FILE_NUMBER {
        return 0;
    }
    value
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let c = NamingConfig::default();
        assert_eq!(c.directory(), "/");
        assert_eq!(c.prefix(), "crashLog-");
        assert_eq!(c.suffix(), ".log");
    }

    #[test]
    fn empty_arguments_fall_back_to_defaults() {
        let c = NamingConfig::new("", "", "").unwrap();
        assert_eq!(c, NamingConfig::default());
        let c = NamingConfig::new("/logs/", "", ".txt").unwrap();
        assert_eq!(c.directory(), "/logs/");
        assert_eq!(c.prefix(), "crashLog-");
        assert_eq!(c.suffix(), ".txt");
    }

    #[test]
    fn overlong_field_is_rejected() {
        let long = "p".repeat(crate::config::FIELD_CAPACITY + 1);
        assert_eq!(NamingConfig::new("/", &long, ".log"), Err(CrashLogError::NameTooLong));
    }

    #[test]
    fn file_path_concatenates_without_separator() {
        let c = NamingConfig::default();
        assert_eq!(c.file_path(1).as_str(), "/crashLog-1.log");
        let c = NamingConfig::new("/logs/", "crash_", ".txt").unwrap();
        assert_eq!(c.file_path(42).as_str(), "/logs/crash_42.txt");
    }

    #[test]
    fn match_name_parses_number() {
        let c = NamingConfig::default();
        assert_eq!(c.match_name("crashLog-7.log"), 7);
        assert_eq!(c.match_name("crashLog-123.log"), 123);
    }

    #[test]
    fn match_name_rejects_wrong_prefix_or_suffix() {
        let c = NamingConfig::default();
        assert_eq!(c.match_name("other-7.log"), 0);
        assert_eq!(c.match_name("crashLog-7.txt"), 0);
        assert_eq!(c.match_name("crashLog-7.log.bak"), 0);
    }

    #[test]
    fn match_name_non_numeric_is_zero() {
        let c = NamingConfig::default();
        assert_eq!(c.match_name("crashLog-abc.log"), 0);
        assert_eq!(c.match_name("crashLog-.log"), 0);
        assert_eq!(c.match_name("crashLog-0.log"), 0);
    }

    #[test]
    fn match_name_takes_leading_digits() {
        let c = NamingConfig::default();
        assert_eq!(c.match_name("crashLog-12abc.log"), 12);
    }

    #[test]
    fn match_name_overflow_is_no_match() {
        let c = NamingConfig::default();
        assert_eq!(c.match_name("crashLog-4294967294.log"), MAX_FILE_NUMBER);
        assert_eq!(c.match_name("crashLog-4294967295.log"), 0);
        assert_eq!(c.match_name("crashLog-4294967296.log"), 0);
    }

    #[test]
    fn match_name_overlapping_prefix_and_suffix() {
        let c = NamingConfig::new("/", "ab", "ba").unwrap();
        assert_eq!(c.match_name("aba"), 0);
        assert_eq!(c.match_name("ab5ba"), 5);
    }

    #[test]
    fn bare_name_strips_directories() {
        assert_eq!(bare_name("/logs/crashLog-1.log"), "crashLog-1.log");
        assert_eq!(bare_name("crashLog-1.log"), "crashLog-1.log");
        assert_eq!(bare_name("/"), "");
    }

    #[test]
    fn entry_path_keeps_qualified_names() {
        let c = NamingConfig::new("/logs/", "", "").unwrap();
        assert_eq!(c.entry_path("crashLog-2.log").as_str(), "/logs/crashLog-2.log");
        assert_eq!(c.entry_path("/logs/crashLog-2.log").as_str(), "/logs/crashLog-2.log");
    }
}
