//! In-memory register window

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{RegisterSource, window_offset};
use crate::registers::{SLOT_PITCH, WORD_STRIDE};
use crate::types::EventRecord;

/// Register bank held in process memory.
///
/// Clones share the same registers, so a test can keep one handle to play the
/// FPGA (writing slots, bumping the head) while a provider owns another.
/// Unwritten registers read as zero, like a freshly reset bank.
#[derive(Debug, Clone)]
pub struct SimulatedWindow {
    base: u32,
    size: usize,
    words: Arc<Mutex<HashMap<usize, u32>>>,
}

impl SimulatedWindow {
    /// Create an empty bank covering `size` bytes from `base`.
    ///
    /// `size` must be a power of two, like a real window.
    pub fn new(base: u32, size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self { base: base & !((size as u32).wrapping_sub(1)), size, words: Arc::default() }
    }

    /// Set a register word.
    pub fn write_u32(&self, address: u32, value: u32) {
        let offset = window_offset(address, self.size);
        self.words.lock().unwrap_or_else(PoisonError::into_inner).insert(offset, value);
    }

    /// Store a record as five consecutive words starting at `address`.
    pub fn write_record(&self, address: u32, record: &EventRecord) {
        for (i, word) in record.to_words().into_iter().enumerate() {
            self.write_u32(address.wrapping_add(i as u32 * WORD_STRIDE), word);
        }
    }

    /// Store a record into ring slot `slot` of a ring starting at `data_address`.
    pub fn write_slot(&self, data_address: u32, slot: u32, record: &EventRecord) {
        self.write_record(data_address.wrapping_add(slot * SLOT_PITCH), record);
    }
}

impl RegisterSource for SimulatedWindow {
    fn read_u32(&self, address: u32) -> u32 {
        let offset = window_offset(address, self.size);
        self.words.lock().unwrap_or_else(PoisonError::into_inner).get(&offset).copied().unwrap_or(0)
    }

    fn contains(&self, address: u32) -> bool {
        let address = u64::from(address);
        let base = u64::from(self.base);
        address >= base && address + u64::from(WORD_STRIDE) <= base + self.size as u64
    }
}
