//! Hardware Abstraction Layer (HAL) for the crash-log facility
//!
//! This crate provides trait-based abstractions for the flash file system
//! the crash logs live on, enabling development and testing without
//! physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Fault trap / application code
//!         ↓
//! crashlog (naming, resolver, capture writer)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Flash file system (LittleFS / SPIFFS / std::fs)
//! ```
//!
//! # Abstractions
//!
//! - [`Storage`] - mount, open, exists, remove, directory enumeration
//! - [`File`] - an open handle; reads and writes through `embedded-io`
//! - Output devices are plain [`embedded_io::Write`] sinks
//!
//! # Features
//!
//! - `std`: [`storage_local::LocalFileStorage`] and the [`mocks`] module
//! - `defmt`: Enable defmt::Format derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{OpenMode, Storage};
//!
//! fn first_byte<S: Storage>(fs: &mut S) -> Result<u8, S::Error> {
//!     use embedded_io::Read;
//!     let mut f = fs.open("/crashLog-1.log", OpenMode::Read)?;
//!     let mut b = [0u8; 1];
//!     f.read(&mut b)?;
//!     Ok(b[0])
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::must_use_candidate)] // accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod mocks;
pub mod storage;
#[cfg(any(test, feature = "std"))]
pub mod storage_local;

pub use storage::{DirEntry, File, OpenMode, Storage, PATH_CAPACITY};
