//! Fault-trap registration.
//!
//! The platform's fault trap calls a fixed free function with the restart
//! info and the faulting stack range, so it cannot be handed a `CrashLog`
//! directly. This module holds the single global that bridges the two: a
//! `'static` [`FaultSink`] installed once at startup, plus the uptime
//! source used to timestamp the record.
//!
//! The sink is shared, not moved in. Application code keeps the same
//! `&'static SharedCrashLog` it installed and goes through
//! [`SharedCrashLog::with`] for `configure`, `read_file`, `remove_file` and
//! the rest, so the path the trap writes to is always the one the
//! application last resolved.
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! static CRASH_LOG: StaticCell<SharedCrashLog<LittleFs>> = StaticCell::new();
//!
//! let log = CRASH_LOG.init(SharedCrashLog::new(CrashLog::new(LittleFs::new(flash))?));
//! crashlog::trap::install(log, millis);
//!
//! // later, from application code
//! log.with(|log| log.configure("/crash/", "", ""));
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use platform::Storage;

use crate::facility::CrashLog;
use crate::record::{FaultInfo, FaultRegisters, StackDump};

/// Something that can persist a fault record.
pub trait FaultSink {
    /// Record `fault`. Must not allocate, block, or panic.
    fn on_fault(&self, fault: &FaultInfo, stack: &StackDump<'_>);
}

/// A [`CrashLog`] shared between application code and the fault trap.
pub struct SharedCrashLog<S: Storage> {
    inner: Mutex<RefCell<CrashLog<S>>>,
}

impl<S: Storage> SharedCrashLog<S> {
    /// Wrap `log` for sharing.
    pub const fn new(log: CrashLog<S>) -> Self {
        Self { inner: Mutex::new(RefCell::new(log)) }
    }

    /// Run `f` on the crash log inside a critical section.
    ///
    /// Returns `None` without calling `f` if the log is already in use
    /// further up the stack, i.e. when called from inside another `with`
    /// or when a fault interrupts one.
    pub fn with<R>(&self, f: impl FnOnce(&mut CrashLog<S>) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let mut log = self.inner.borrow(cs).try_borrow_mut().ok()?;
            Some(f(&mut log))
        })
    }

    /// Give back the crash log.
    pub fn into_inner(self) -> CrashLog<S> {
        self.inner.into_inner().into_inner()
    }
}

impl<S: Storage> FaultSink for SharedCrashLog<S> {
    fn on_fault(&self, fault: &FaultInfo, stack: &StackDump<'_>) {
        // A fault while application code holds the log is dropped: the
        // resolver cache may be half updated.
        let _ = self.with(|log| log.capture(fault, stack));
    }
}

#[derive(Clone, Copy)]
struct Installed {
    sink: &'static (dyn FaultSink + Sync),
    uptime_ms: fn() -> u32,
    busy: bool,
}

static TRAP: Mutex<RefCell<Option<Installed>>> = Mutex::new(RefCell::new(None));

/// Install `sink` as the fault handler, timestamping records with `uptime_ms`.
///
/// Returns the previously installed sink, if any.
pub fn install(
    sink: &'static (dyn FaultSink + Sync),
    uptime_ms: fn() -> u32,
) -> Option<&'static (dyn FaultSink + Sync)> {
    critical_section::with(|cs| {
        TRAP.borrow_ref_mut(cs)
            .replace(Installed { sink, uptime_ms, busy: false })
            .map(|old| old.sink)
    })
}

/// Remove the installed sink and hand it back.
pub fn uninstall() -> Option<&'static (dyn FaultSink + Sync)> {
    critical_section::with(|cs| TRAP.borrow_ref_mut(cs).take().map(|old| old.sink))
}

/// `true` if a sink is installed.
pub fn is_installed() -> bool {
    critical_section::with(|cs| TRAP.borrow_ref(cs).is_some())
}

/// Route a fault to the installed sink.
///
/// `fault.uptime_ms` is overwritten with the installed clock. Returns
/// `false` when nothing is installed, or when the sink is already busy with
/// an earlier fault (a fault inside the capture itself); that second fault
/// is dropped so the first record can finish.
pub fn dispatch(fault: FaultInfo, stack: &StackDump<'_>) -> bool {
    let claimed = critical_section::with(|cs| {
        let mut trap = TRAP.borrow_ref_mut(cs);
        let installed = trap.as_mut().filter(|i| !i.busy)?;
        installed.busy = true;
        Some(*installed)
    });
    let Some(Installed { sink, uptime_ms, .. }) = claimed else {
        return false;
    };

    let fault = FaultInfo { uptime_ms: uptime_ms(), ..fault };
    sink.on_fault(&fault, stack);

    // Whatever is installed now is free again, including a sink that was
    // swapped in while this one was capturing.
    critical_section::with(|cs| {
        if let Some(installed) = TRAP.borrow_ref_mut(cs).as_mut() {
            installed.busy = false;
        }
    });
    true
}

/// Entry point for the platform fault trap.
///
/// # Safety
///
/// `[stack_start, stack_end)` must be readable memory (it is clipped to
/// `MAX_STACK_DUMP_BYTES`). The trap passes the faulting task's stack,
/// which satisfies this.
#[allow(clippy::too_many_arguments)]
pub unsafe fn on_fault(
    restart_reason: u32,
    exception_cause: u32,
    epc1: u32,
    epc2: u32,
    epc3: u32,
    excvaddr: u32,
    depc: u32,
    stack_start: usize,
    stack_end: usize,
) -> bool {
    // SAFETY: forwarded from the caller's contract.
    let stack = unsafe { StackDump::from_raw(stack_start, stack_end) };
    let fault = FaultInfo {
        uptime_ms: 0,
        restart_reason,
        exception_cause,
        registers: FaultRegisters { epc1, epc2, epc3, excvaddr, depc },
    };
    dispatch(fault, &stack)
}

/// Restart info the ESP8266 SDK hands to `custom_crash_callback`.
#[cfg(feature = "esp8266")]
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RstInfo {
    /// Restart reason code.
    pub reason: u32,
    /// Exception cause code.
    pub exccause: u32,
    /// Exception PC, level 1.
    pub epc1: u32,
    /// Exception PC, level 2.
    pub epc2: u32,
    /// Exception PC, level 3.
    pub epc3: u32,
    /// Faulting virtual address.
    pub excvaddr: u32,
    /// Double-exception PC.
    pub depc: u32,
}

/// ESP8266 core hook, called after an exception and before the reset.
///
/// # Safety
///
/// Called only by the ESP8266 core, with a valid `rst_info` and the
/// faulting stack range.
#[cfg(feature = "esp8266")]
#[no_mangle]
pub unsafe extern "C" fn custom_crash_callback(rst_info: *const RstInfo, stack: u32, stack_end: u32) {
    // SAFETY: the core passes a pointer to its static restart info.
    let Some(info) = (unsafe { rst_info.as_ref() }) else {
        return;
    };
    // SAFETY: the core passes the bounds of the stack that faulted.
    unsafe {
        on_fault(
            info.reason,
            info.exccause,
            info.epc1,
            info.epc2,
            info.epc3,
            info.excvaddr,
            info.depc,
            stack as usize,
            stack_end as usize,
        );
    }
}
