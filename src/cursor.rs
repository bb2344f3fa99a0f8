//! Consumer cursor over the FPGA ring buffer
//!
//! The FPGA advances a head counter every time it writes a slot; the logger
//! keeps the tail locally. The number of unread slots is
//! `(head - tail) mod length` in wrapping `u32` arithmetic, which stays correct
//! when the hardware counter rolls over. `length` must be a power of two so
//! the modulo is consistent across that rollover.

use tracing::{trace, warn};

use crate::window::RegisterSource;
use crate::{Result, TelemetryError};

/// Advance a ring position by `stride` slots, wrapping at `length`.
///
/// `length` must be a non-zero power of two, as [`RingCursor::new`] enforces.
#[inline]
pub fn advance(tail: u32, length: u32, stride: u32) -> u32 {
    debug_assert!(length.is_power_of_two(), "ring length {length} is not a power of two");
    tail.wrapping_add(stride) % length
}

/// Unread slots between a producer head and a consumer tail.
///
/// `length` must be a non-zero power of two, as [`RingCursor::new`] enforces.
#[inline]
pub fn unread(head: u32, tail: u32, length: u32) -> u32 {
    debug_assert!(length.is_power_of_two(), "ring length {length} is not a power of two");
    head.wrapping_sub(tail) % length
}

/// Counters describing how the consumer keeps up with the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorStats {
    /// Head register reads
    pub polls: u64,
    /// Polls that found nothing new
    pub idle_polls: u64,
    /// Slots consumed
    pub consumed: u64,
    /// Largest backlog seen on a single poll
    pub max_backlog: u32,
    /// Polls where the ring was full; entries may have been overwritten
    pub saturated_polls: u64,
}

/// Local tail plus the fixed geometry of the ring.
#[derive(Debug, Clone)]
pub struct RingCursor {
    head_address: u32,
    data_address: u32,
    length: u32,
    slot_pitch: u32,
    tail: u32,
    stats: CursorStats,
}

impl RingCursor {
    /// Create a cursor starting at slot 0.
    pub fn new(head_address: u32, data_address: u32, length: u32, slot_pitch: u32) -> Result<Self> {
        if !length.is_power_of_two() {
            return Err(TelemetryError::config_error(format!(
                "ring length {length} is not a power of two"
            )));
        }
        if slot_pitch == 0 {
            return Err(TelemetryError::config_error("ring slot pitch must be non-zero"));
        }

        Ok(Self { head_address, data_address, length, slot_pitch, tail: 0, stats: CursorStats::default() })
    }

    /// Read the head register once and return the number of unread slots.
    pub fn poll_fill<S: RegisterSource + ?Sized>(&mut self, source: &S) -> u32 {
        let head = source.read_u32(self.head_address);
        let fill = unread(head, self.tail, self.length);

        self.stats.polls += 1;
        if fill == 0 {
            self.stats.idle_polls += 1;
            return 0;
        }

        self.stats.max_backlog = self.stats.max_backlog.max(fill);
        if fill == self.length - 1 {
            self.stats.saturated_polls += 1;
            warn!(head, tail = self.tail, fill, "Ring buffer full, producer may have overrun the reader");
        } else {
            trace!(head, tail = self.tail, fill, "Ring buffer has unread slots");
        }

        fill
    }

    /// Address of the oldest unread slot.
    pub fn next_slot_address(&self) -> u32 {
        self.data_address.wrapping_add(self.tail * self.slot_pitch)
    }

    /// Mark the oldest unread slot consumed.
    ///
    /// Callers only consume after [`poll_fill`](Self::poll_fill) reported a
    /// non-zero fill, so the tail never passes the head.
    pub fn consume(&mut self) {
        self.tail = advance(self.tail, self.length, 1);
        self.stats.consumed += 1;
    }

    pub fn tail(&self) -> u32 {
        self.tail
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn head_address(&self) -> u32 {
        self.head_address
    }

    pub fn data_address(&self) -> u32 {
        self.data_address
    }

    pub fn slot_pitch(&self) -> u32 {
        self.slot_pitch
    }

    pub fn stats(&self) -> CursorStats {
        self.stats
    }
}
