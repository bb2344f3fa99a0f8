//! FADS register map for the current FPGA revision.
//!
//! These addresses are the contract with the hardware producer. They change
//! only together with the bitstream, never at runtime.

/// Default memory device exposing physical memory.
pub const DEV_MEM: &str = "/dev/mem";

/// Physical base address of the FADS register bank.
pub const FADS_BASE: u32 = 0x4060_0000;

/// Size of the mapped window. Must be a power of two covering every
/// register below.
pub const WINDOW_SIZE: usize = 0x2_0000;

/// Live telemetry registers (latest event), five consecutive words.
pub const TELEMETRY_OFFSET: u32 = 0x0200;

/// Ring buffer write pointer, advanced by the FPGA.
pub const RING_HEAD_OFFSET: u32 = 0x1000;

/// Start of the ring buffer slots.
pub const RING_DATA_OFFSET: u32 = 0x1_0000;

/// Number of slots in the ring. Power of two.
pub const RING_LENGTH: u32 = 0x10;

/// Byte distance between consecutive register words.
pub const WORD_STRIDE: u32 = 0x4;

/// Words per event record: id, intensity, width, classification, timestamp.
pub const RECORD_WORDS: u32 = 5;

/// Byte distance between consecutive ring slots.
pub const SLOT_PITCH: u32 = RECORD_WORDS * WORD_STRIDE;

/// Absolute address of the telemetry registers.
pub const fn telemetry_address() -> u32 {
    FADS_BASE + TELEMETRY_OFFSET
}

/// Absolute address of the ring head register.
pub const fn ring_head_address() -> u32 {
    FADS_BASE + RING_HEAD_OFFSET
}

/// Absolute address of ring slot 0.
pub const fn ring_data_address() -> u32 {
    FADS_BASE + RING_DATA_OFFSET
}
