//! Register window access
//!
//! The FPGA publishes its telemetry through a bank of 32-bit registers that
//! the logger sees through a read-only memory window. Everything that touches
//! that memory goes through [`RegisterSource`]:
//!
//! - [`RegisterWindow`] maps the physical range through `/dev/mem`
//! - [`SimulatedWindow`] keeps the registers in process memory, for tests and
//!   bench setups without hardware
//!
//! Callers pass absolute physical addresses; the source confines every access
//! to its window, so no caller ever does pointer arithmetic.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fads_logger::registers;
//! use fads_logger::window::{RegisterSource, RegisterWindow};
//!
//! let window = RegisterWindow::open(registers::FADS_BASE, registers::WINDOW_SIZE)?;
//! let head = window.read_u32(registers::ring_head_address());
//! println!("head = {head}");
//! # Ok::<(), fads_logger::TelemetryError>(())
//! ```

mod devmem;
mod simulated;

pub use devmem::RegisterWindow;
pub use simulated::SimulatedWindow;

use crate::registers::{RECORD_WORDS, WORD_STRIDE};
use crate::types::EventRecord;

/// Read-only access to a bank of 32-bit hardware registers.
pub trait RegisterSource: Send {
    /// Read one register word. Every call performs a fresh read.
    fn read_u32(&self, address: u32) -> u32;

    /// Whether `address` lies inside the window without masking.
    fn contains(&self, address: u32) -> bool;

    /// Read an event record stored as consecutive words starting at `address`.
    fn read_record(&self, address: u32) -> EventRecord {
        let mut words = [0u32; RECORD_WORDS as usize];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.read_u32(address.wrapping_add(i as u32 * WORD_STRIDE));
        }
        EventRecord::from_words(words)
    }
}

/// Offset of `address` inside a window of `size` bytes, aligned down to a word.
#[inline]
pub(crate) fn window_offset(address: u32, size: usize) -> usize {
    (address as usize) & (size - 1) & !(WORD_STRIDE as usize - 1)
}
