//! Crash-log accessors against an in-memory volume.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crashlog::{CrashLog, CrashLogError, FaultInfo, FaultRegisters, NamingConfig, StackDump};
use platform::mocks::{MockOp, MockStorage};

/// Byte sink standing in for a serial port.
#[derive(Default)]
struct Serial(Vec<u8>);

impl embedded_io::ErrorType for Serial {
    type Error = core::convert::Infallible;
}

impl embedded_io::Write for Serial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Serial port whose line has dropped.
struct Unplugged;

impl embedded_io::ErrorType for Unplugged {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Write for Unplugged {
    fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
        Err(embedded_io::ErrorKind::BrokenPipe)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn fault(uptime_ms: u32) -> FaultInfo {
    FaultInfo {
        uptime_ms,
        restart_reason: 2,
        exception_cause: 28,
        registers: FaultRegisters { epc1: 0x4020_1000, ..FaultRegisters::default() },
    }
}

#[test]
fn empty_volume() {
    let mut log = CrashLog::new(MockStorage::new()).unwrap();
    assert_eq!(log.crash_log_path(), "/crashLog-1.log");
    assert_eq!(log.last_crash_log_path(), None);
    assert_eq!(log.count(), 0);
    assert_eq!(log.remove_file(0), Err(CrashLogError::FileNotFound));

    let mut called = false;
    log.for_each_match(|_, _| called = true);
    assert!(!called);
}

#[test]
fn read_missing_file_leaves_empty_string() {
    let mut log = CrashLog::new(MockStorage::new()).unwrap();
    let mut buf = [0xffu8; 16];
    assert_eq!(log.read_file(99u32, &mut buf), Err(CrashLogError::FileNotFound));
    assert_eq!(buf[0], 0);
}

#[test]
fn read_most_recent_by_zero() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-1.log", b"one");
    fs.add_file("/crashLog-2.log", b"two");
    let mut log = CrashLog::new(fs).unwrap();
    let mut buf = [0xffu8; 8];
    assert_eq!(log.read_file(0u32, &mut buf), Ok(3));
    assert_eq!(&buf[..4], b"two\0");
}

#[test]
fn read_by_path() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-5.log", b"five");
    let mut log = CrashLog::new(fs).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(log.read_file("/crashLog-5.log", &mut buf), Ok(4));
    assert_eq!(&buf[..5], b"five\0");
}

#[test]
fn read_is_capped_at_buffer() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-1.log", b"0123456789");
    let mut log = CrashLog::new(fs).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(log.read_file(1u32, &mut buf), Ok(4));
    assert_eq!(&buf, b"0123");
}

#[test]
fn print_copies_bytes() {
    let fs = MockStorage::new();
    let body: Vec<u8> = (0..200u8).collect();
    fs.add_file("/crashLog-3.log", &body);
    let mut log = CrashLog::new(fs).unwrap();
    let mut serial = Serial::default();
    assert_eq!(log.print_file(3u32, &mut serial), Ok(200));
    assert_eq!(serial.0, body);
}

#[test]
fn print_missing_writes_nothing() {
    let mut log = CrashLog::new(MockStorage::new()).unwrap();
    let mut serial = Serial::default();
    assert_eq!(log.print_file(0u32, &mut serial), Err(CrashLogError::FileNotFound));
    assert!(serial.0.is_empty());
}

#[test]
fn remove_then_rotate() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-3.log", b"");
    fs.add_file("/crashLog-7.log", b"");
    let mut log = CrashLog::new(fs.clone()).unwrap();
    assert_eq!(log.crash_log_path(), "/crashLog-8.log");
    assert_eq!(log.last_crash_log_path(), Some("/crashLog-7.log"));

    log.remove_file(0).unwrap();
    assert_eq!(fs.paths(), vec!["/crashLog-3.log".to_string()]);
    assert_eq!(log.crash_log_path(), "/crashLog-4.log");
    assert_eq!(log.last_crash_log_path(), Some("/crashLog-3.log"));

    assert_eq!(log.remove_file(7), Err(CrashLogError::FileNotFound));
    log.remove_file(3).unwrap();
    assert_eq!(log.count(), 0);
    assert_eq!(log.crash_log_path(), "/crashLog-1.log");
}

#[test]
fn configure_switches_directory_and_pattern() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-2.log", b"");
    fs.add_file("/faults/err_9.txt", b"");
    let mut log = CrashLog::new(fs).unwrap();

    log.configure("/faults/", "err_", ".txt").unwrap();
    assert_eq!(log.directory(), "/faults/");
    assert_eq!(log.prefix(), "err_");
    assert_eq!(log.suffix(), ".txt");
    assert_eq!(log.count(), 1);
    assert_eq!(log.crash_log_path(), "/faults/err_10.txt");
    assert_eq!(log.last_crash_log_path(), Some("/faults/err_9.txt"));

    log.configure("", "", "").unwrap();
    assert_eq!(log.config(), &NamingConfig::default());
    assert_eq!(log.crash_log_path(), "/crashLog-3.log");
}

#[test]
fn configure_rejects_overlong_prefix() {
    let mut log = CrashLog::new(MockStorage::new()).unwrap();
    let long = "x".repeat(200);
    assert_eq!(log.configure("/", &long, ".log"), Err(CrashLogError::NameTooLong));
    assert_eq!(log.prefix(), "crashLog-");
}

#[test]
fn capture_goes_to_cached_next_path() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-1.log", b"");
    let mut log = CrashLog::new(fs.clone()).unwrap();
    fs.clear_ops();

    log.capture(&fault(500), &StackDump::empty());
    let text = String::from_utf8(fs.contents("/crashLog-2.log").unwrap()).unwrap();
    assert!(text.starts_with("Crashed at 500 ms\nRestart reason: 2\nException cause: 28\n"));
    assert!(!fs.ops().iter().any(|op| matches!(op, MockOp::ReadDir(_))));

    // Not refreshed: a second fault before reboot lands in the same file.
    log.capture(&fault(900), &StackDump::empty());
    let text = String::from_utf8(fs.contents("/crashLog-2.log").unwrap()).unwrap();
    assert_eq!(text.matches("Crashed at").count(), 2);
    assert_eq!(log.crash_log_path(), "/crashLog-2.log");
}

#[test]
fn capture_scenario_single_stack_line() {
    let fs = MockStorage::new();
    let mut log = CrashLog::new(fs.clone()).unwrap();
    let stack: Vec<u8> = (0..16u8).collect();
    log.capture(&fault(1), &StackDump::new(0x3fff_fff0, &stack));

    let text = String::from_utf8(fs.contents("/crashLog-1.log").unwrap()).unwrap();
    let dump = text.split_once(">>>stack>>>\n").unwrap().1;
    assert_eq!(dump, "3ffffff0: 03020100 07060504 0b0a0908 0f0e0d0c \n<<<stack<<<\n\n");
}

#[test]
fn matches_yield_paths() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-2.log", b"");
    fs.add_file("/crashLog-1.log", b"");
    let mut log = CrashLog::new(fs).unwrap();
    let found: Vec<_> = log.matches().map(|f| (f.number, f.path.to_string())).collect();
    assert_eq!(
        found,
        vec![(2, "/crashLog-2.log".to_string()), (1, "/crashLog-1.log".to_string())]
    );
}

#[test]
fn read_failure_midway_empties_buffer() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-1.log", b"Crashed at 10 ms\n");
    let mut log = CrashLog::new(fs.clone()).unwrap();
    fs.set_fail_read_after(Some(4));
    let mut buf = [0xffu8; 32];
    assert_eq!(log.read_file(1u32, &mut buf), Err(CrashLogError::ReadFailed));
    assert_eq!(buf[0], 0);
}

#[test]
fn print_read_failure_is_read_failed() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-1.log", b"abc");
    let mut log = CrashLog::new(fs.clone()).unwrap();
    fs.set_fail_read_after(Some(0));
    let mut serial = Serial::default();
    assert_eq!(log.print_file(1u32, &mut serial), Err(CrashLogError::ReadFailed));
    assert!(serial.0.is_empty());
}

#[test]
fn print_to_failing_sink_is_write_failed() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-1.log", b"abc");
    let mut log = CrashLog::new(fs).unwrap();
    assert_eq!(log.print_file(1u32, &mut Unplugged), Err(CrashLogError::WriteFailed));
}

#[test]
fn capture_never_appends_to_reserved_top_number() {
    let fs = MockStorage::new();
    fs.add_file("/crashLog-4294967295.log", b"old record\n");
    let mut log = CrashLog::new(fs.clone()).unwrap();
    log.capture(&fault(3), &StackDump::empty());
    assert_eq!(fs.contents("/crashLog-4294967295.log").unwrap(), b"old record\n");
    assert!(fs.contents("/crashLog-1.log").unwrap().starts_with(b"Crashed at 3 ms\n"));
}
