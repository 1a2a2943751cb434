//! Capture writer, run from inside the fault trap.
//!
//! Appends one crash record to the path the resolver cached beforehand.
//! The budget is roughly 15–20 ms on an ESP8266 before the hardware
//! watchdog resets the chip, of which the flash write takes 10–11 ms, so
//! this does the minimum: no directory scan, no retries, no heap, no
//! logging. Failures cannot be reported from here and are dropped.

use platform::{File as _, OpenMode, Storage};

use crate::record::{write_record, FaultInfo, StackDump};

/// Append a crash record for `fault` to `path`.
///
/// Opens `path` for append, falling back to create when it does not exist
/// yet. If neither open succeeds nothing is written.
pub fn capture<S: Storage>(storage: &mut S, path: &str, fault: &FaultInfo, stack: &StackDump<'_>) {
    let mut file = match storage.open(path, OpenMode::Append) {
        Ok(file) => file,
        Err(_) => match storage.open(path, OpenMode::Write) {
            Ok(file) => file,
            Err(_) => return,
        },
    };
    write_record(&mut file, fault, stack);
    let _ = file.close();
}
