//! End-to-end: crash logs on a host directory through `LocalFileStorage`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;

use crashlog::{CrashLog, CrashLogError, FaultInfo, StackDump};
use platform::storage_local::LocalFileStorage;
use tempfile::TempDir;

fn open(dir: &TempDir) -> CrashLog<LocalFileStorage> {
    CrashLog::new(LocalFileStorage::new(dir.path())).unwrap()
}

#[test]
fn capture_then_read_back_after_reboot() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("crashLog-4.log"), b"old\n").unwrap();
    fs::write(dir.path().join("notes.txt"), b"").unwrap();

    let mut log = open(&dir);
    assert_eq!(log.crash_log_path(), "/crashLog-5.log");
    let stack = [0xaau8; 20];
    log.capture(
        &FaultInfo { uptime_ms: 42, restart_reason: 3, ..FaultInfo::default() },
        &StackDump::new(0x3fff_fe00, &stack),
    );
    drop(log);

    // Reboot.
    let mut log = open(&dir);
    assert_eq!(log.count(), 2);
    assert_eq!(log.last_crash_log_path(), Some("/crashLog-5.log"));
    assert_eq!(log.crash_log_path(), "/crashLog-6.log");

    let mut buf = [0u8; 512];
    let n = log.read_file(0u32, &mut buf).unwrap();
    let text = std::str::from_utf8(&buf[..n]).unwrap();
    assert!(text.starts_with("Crashed at 42 ms\nRestart reason: 3\n"));
    assert!(text.contains("3ffffe00: aaaaaaaa aaaaaaaa aaaaaaaa aaaaaaaa \n"));
    assert!(text.contains("3ffffe10: aaaaaaaa \n"));
    assert!(text.ends_with("<<<stack<<<\n\n"));
    assert_eq!(buf[n], 0);
}

#[test]
fn remove_deletes_host_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("crashLog-1.log"), b"x").unwrap();
    let mut log = open(&dir);
    log.remove_file(1).unwrap();
    assert!(!dir.path().join("crashLog-1.log").exists());
    assert_eq!(log.remove_file(1), Err(CrashLogError::FileNotFound));
}

#[test]
fn subdirectory_configuration() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("crash")).unwrap();
    fs::write(dir.path().join("crash/c12.txt"), b"").unwrap();
    let mut log = open(&dir);
    log.configure("/crash/", "c", ".txt").unwrap();
    assert_eq!(log.crash_log_path(), "/crash/c13.txt");

    log.capture(&FaultInfo::default(), &StackDump::empty());
    assert!(dir.path().join("crash/c13.txt").exists());
}

#[test]
fn missing_directory_resolves_to_first_file() {
    let dir = TempDir::new().unwrap();
    let mut log = open(&dir);
    assert_eq!(
        log.configure("/nowhere/", "", ""),
        Err(CrashLogError::FileSystemUnavailable)
    );
    assert_eq!(log.crash_log_path(), "/nowhere/crashLog-1.log");
    assert_eq!(log.count(), 0);
}
