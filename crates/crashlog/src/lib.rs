//! Crash logs for flash-backed microcontrollers
//!
//! When the processor faults, the fault trap hands over the restart reason,
//! the exception registers and the faulting stack. This crate appends that
//! context as a plain-text record to a numbered file on the device's file
//! system, so it survives the reset and can be read back afterwards.
//!
//! # Architecture
//!
//! ```text
//! fault trap ──► trap::dispatch ──┐
//!                                  ▼
//!                           SharedCrashLog ──► CrashLog::capture
//!                                  ▲           (cached path, no scan, no heap)
//! application ──► with(|log| ..) ──┘
//!                     │
//!                     └──► configure / read_file / print_file / remove_file
//!                          (Resolver ──► Storage::read_dir)
//! ```
//!
//! Files are named `<directory><prefix><n><suffix>`, `/crashLog-1.log` by
//! default. The next crash goes to one past the highest number found; the
//! directory listing is the only index.
//!
//! # Features
//!
//! - `std`: `std::error::Error` for [`CrashLogError`]
//! - `defmt`: log through defmt, derive `defmt::Format`
//! - `tracing`: log through tracing (host builds)
//! - `serde`: (de)serialize [`NamingConfig`]
//! - `esp8266`: export the SDK's `custom_crash_callback` hook

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
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod log;

pub mod capture;
pub mod config;
pub mod error;
pub mod facility;
pub mod naming;
pub mod record;
pub mod resolver;
pub mod trap;

pub use error::CrashLogError;
pub use facility::{CrashLog, FileRef};
pub use naming::NamingConfig;
pub use record::{FaultInfo, FaultRegisters, StackDump};
pub use resolver::{CrashFile, Matches, ResolvedPaths, Resolver};
pub use trap::{FaultSink, SharedCrashLog};
