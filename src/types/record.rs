//! Event record types

use crate::registers::RECORD_WORDS;

/// Raw event record as laid out by the FPGA: five consecutive 32-bit words.
///
/// Constructed fresh on every poll and never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventRecord {
    /// Event counter, incremented once per physical event
    pub id: u32,

    /// Signed ADC-style intensity reading
    pub intensity_raw: i32,

    /// Event width in sample clock ticks
    pub width_raw: u32,

    /// Sort classification
    pub classification: u32,

    /// Hardware timestamp
    pub timestamp_raw: u32,
}

impl EventRecord {
    /// Build a record from the five register words in hardware order.
    ///
    /// The intensity word is reinterpreted as two's complement.
    pub fn from_words(words: [u32; RECORD_WORDS as usize]) -> Self {
        Self {
            id: words[0],
            intensity_raw: words[1] as i32,
            width_raw: words[2],
            classification: words[3],
            timestamp_raw: words[4],
        }
    }

    /// The register words in hardware order.
    pub fn to_words(&self) -> [u32; RECORD_WORDS as usize] {
        [
            self.id,
            self.intensity_raw as u32,
            self.width_raw,
            self.classification,
            self.timestamp_raw,
        ]
    }
}

/// Event record converted to engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSample {
    pub id: u32,
    pub intensity_raw: i32,
    /// Calibrated intensity
    pub intensity: f64,
    pub width_raw: u32,
    /// Event width in seconds
    pub width: f64,
    pub classification: u32,
    pub timestamp: u32,
}
