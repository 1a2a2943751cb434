//! Crash record text format.
//!
//! One record per fault, appended to the current crash log:
//!
//! ```text
//! Crashed at 1234 ms
//! Restart reason: 2
//! Exception cause: 29
//! epc1=0x40201234 epc2=0x00000000 epc3=0x00000000 excvaddr=0x00000000 depc=0x00000000
//! >>>stack>>>
//! 3ffffff0: feefeffe feefeffe 3ffe8508 40100459
//! <<<stack<<<
//!
//! ```
//!
//! Everything is formatted through a single [`Line`] buffer on the stack.
//! Nothing here allocates; this code runs inside the fault trap.

use core::fmt::Write as _;

use heapless::String;

use crate::config::{LINE_BUFFER_SIZE, MAX_STACK_DUMP_BYTES, STACK_LINE_BYTES};

/// Opens the stack dump section.
pub const STACK_START_MARKER: &str = ">>>stack>>>\n";

/// Closes the stack dump section and the record.
pub const STACK_END_MARKER: &str = "<<<stack<<<\n\n";

/// Fixed-size formatting buffer used at fault time.
pub type Line = String<LINE_BUFFER_SIZE>;

/// The five exception registers saved by the fault trap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultRegisters {
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

/// Everything known about a fault apart from the stack contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultInfo {
    /// Milliseconds since boot when the trap ran.
    pub uptime_ms: u32,
    /// Platform restart-reason code.
    pub restart_reason: u32,
    /// Processor exception-cause code.
    pub exception_cause: u32,
    /// Saved exception registers.
    pub registers: FaultRegisters,
}

/// A window of memory to dump, starting at address `base`.
#[derive(Debug, Clone, Copy)]
pub struct StackDump<'a> {
    base: usize,
    bytes: &'a [u8],
}

impl<'a> StackDump<'a> {
    /// Dump `bytes`, labelling the first one with address `base`.
    pub fn new(base: usize, bytes: &'a [u8]) -> Self {
        Self { base, bytes }
    }

    /// Nothing to dump.
    pub const fn empty() -> Self {
        Self { base: 0, bytes: &[] }
    }

    /// Address of the first byte.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Dumped bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// `(address, bytes)` for each dump line. The last chunk is shorter when
    /// the range is not a multiple of [`STACK_LINE_BYTES`]; nothing past the
    /// end of the range is read.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &'a [u8])> + '_ {
        let base = self.base;
        let bytes: &'a [u8] = self.bytes;
        bytes
            .chunks(STACK_LINE_BYTES)
            .enumerate()
            .map(move |(i, chunk)| (base.wrapping_add(i.wrapping_mul(STACK_LINE_BYTES)), chunk))
    }
}

impl StackDump<'static> {
    /// View the live memory range `[start, end)`.
    ///
    /// An inverted range yields an empty dump; a range longer than
    /// [`MAX_STACK_DUMP_BYTES`] is cut at that length.
    ///
    /// # Safety
    ///
    /// Every byte of `[start, min(end, start + MAX_STACK_DUMP_BYTES))` must
    /// be readable memory for the rest of the program. The fault trap
    /// satisfies this for the stack it reports, since the device resets
    /// once the record is written.
    pub unsafe fn from_raw(start: usize, end: usize) -> Self {
        let len = end.saturating_sub(start).min(MAX_STACK_DUMP_BYTES);
        if len == 0 || start == 0 {
            return Self::empty();
        }
        // SAFETY: caller guarantees the (clamped) range is readable; start is non-null.
        let bytes = unsafe { core::slice::from_raw_parts(start as *const u8, len) };
        Self { base: start, bytes }
    }
}

/// Format the header lines (time, restart reason, exception cause).
pub fn format_header(line: &mut Line, fault: &FaultInfo) {
    line.clear();
    let _ = write!(
        line,
        "Crashed at {} ms\nRestart reason: {}\nException cause: {}\n",
        fault.uptime_ms, fault.restart_reason, fault.exception_cause
    );
}

/// Format the register line followed by the stack start marker.
pub fn format_registers(line: &mut Line, regs: &FaultRegisters) {
    line.clear();
    let _ = write!(
        line,
        "epc1=0x{:08x} epc2=0x{:08x} epc3=0x{:08x} excvaddr=0x{:08x} depc=0x{:08x}\n{}",
        regs.epc1, regs.epc2, regs.epc3, regs.excvaddr, regs.depc, STACK_START_MARKER
    );
}

/// Format one stack dump line: the address, then each 32-bit word
/// (little-endian) followed by a space, then a newline.
///
/// A trailing partial word is zero-extended.
pub fn format_stack_line(line: &mut Line, address: usize, chunk: &[u8]) {
    line.clear();
    let _ = write!(line, "{address:08x}: ");
    for word in chunk.chunks(4) {
        let mut le = [0u8; 4];
        for (dst, src) in le.iter_mut().zip(word) {
            *dst = *src;
        }
        let _ = write!(line, "{:08x} ", u32::from_le_bytes(le));
    }
    let _ = line.push('\n');
}

/// Write a complete record to `out`.
///
/// Best effort: a failed write is not retried and does not stop the
/// remaining lines from being attempted.
pub fn write_record<W: embedded_io::Write>(out: &mut W, fault: &FaultInfo, stack: &StackDump<'_>) {
    let mut line = Line::new();

    format_header(&mut line, fault);
    put(out, line.as_bytes());

    format_registers(&mut line, &fault.registers);
    put(out, line.as_bytes());

    for (address, chunk) in stack.lines() {
        format_stack_line(&mut line, address, chunk);
        put(out, line.as_bytes());
    }

    put(out, STACK_END_MARKER.as_bytes());
}

/// Write all of `bytes`, giving up on the first error or zero-length write.
pub(crate) fn put<W: embedded_io::Write>(out: &mut W, mut bytes: &[u8]) -> bool {
    while !bytes.is_empty() {
        match out.write(bytes) {
            Ok(n) if n > 0 => bytes = bytes.get(n..).unwrap_or(&[]),
            _ => return false,
        }
    }
    true
}
