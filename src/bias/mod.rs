//! Bias DAC programming over SPI
//!
//! The detector bias channels are set by sending two-byte frames to the bias
//! controller. A frame carries a 4-bit channel address and a 10-bit value:
//!
//! ```text
//! byte 0: AAAA VVVV    address, value bits 9..6
//! byte 1: VVVV VV01    value bits 5..0, fixed tag
//! ```
//!
//! After each frame the controller is asked for its identification and a
//! three-byte loopback pattern, which is logged so a missing or miswired
//! controller shows up immediately.
//!
//! ```rust
//! use fads_logger::bias::{BiasSetting, parse_bias_table};
//!
//! let settings = parse_bias_table("5\t657\n")?;
//! assert_eq!(settings, vec![BiasSetting::new(0, 5, 657)?]);
//! assert_eq!(settings[0].encode(), [0x5A, 0x45]);
//! # Ok::<(), fads_logger::TelemetryError>(())
//! ```

#[cfg(target_os = "linux")]
mod spidev;

#[cfg(target_os = "linux")]
pub use spidev::SpiDev;

use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info};

use crate::{Result, TelemetryError};

/// Default SPI device of the bias controller.
pub const DEFAULT_SPI_DEVICE: &str = "/dev/spidev1.0";

/// Default SPI clock.
pub const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/// Valid bias channel addresses.
pub const ADDRESS_RANGE: RangeInclusive<i64> = 1..=6;

/// Valid bias values (10 bits).
pub const VALUE_RANGE: RangeInclusive<i64> = 0..=1023;

/// Tag in the low bits of the second frame byte.
const FRAME_TAG: u8 = 0b01;

/// Identification command sent before the loopback pattern.
pub const RDID_COMMAND: u8 = 0x9f;

/// Pattern clocked out after the identification command.
pub const LOOPBACK_PATTERN: [u8; 3] = [0x01, 0x23, 0x45];

/// One bias channel setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiasSetting {
    address: u8,
    value: u16,
}

impl BiasSetting {
    /// Validate a setting. `index` identifies the entry in error messages.
    pub fn new(index: usize, address: i64, value: i64) -> Result<Self> {
        if !ADDRESS_RANGE.contains(&address) || !VALUE_RANGE.contains(&value) {
            return Err(TelemetryError::InvalidBias { index, address, value });
        }
        Ok(Self { address: address as u8, value: value as u16 })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Pack the setting into its two-byte wire frame.
    pub fn encode(&self) -> [u8; 2] {
        let address = self.address & 0xF;
        let value = self.value & 0x3FF;
        [(address << 4) | ((value >> 6) as u8 & 0xF), (((value & 0x3F) as u8) << 2) | FRAME_TAG]
    }
}

/// Parse a table of `address<TAB>value` lines.
///
/// Blank lines are skipped. The whole table is validated before anything is
/// returned, so a bad entry never leaves the controller half-programmed.
pub fn parse_bias_table(text: &str) -> Result<Vec<BiasSetting>> {
    let mut settings = Vec::new();

    for (line_no, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [address, value] = fields.as_slice() else {
            return Err(TelemetryError::parse_error(
                format!("bias table line {line_no}"),
                format!("expected 2 fields, found {}", fields.len()),
            ));
        };

        let parse = |field: &str| {
            field.parse::<i64>().map_err(|e| {
                TelemetryError::parse_error(format!("bias table line {line_no}"), format!("{field:?}: {e}"))
            })
        };
        settings.push(BiasSetting::new(settings.len(), parse(*address)?, parse(*value)?)?);
    }

    Ok(settings)
}

/// Read and validate a bias table file.
pub fn load_bias_table(path: impl AsRef<Path>) -> Result<Vec<BiasSetting>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        TelemetryError::parse_error(format!("bias table {}", path.display()), e.to_string())
    })?;
    parse_bias_table(&text)
}

/// Controller response read back after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopbackResponse {
    /// Byte clocked in while sending the identification command
    pub id: u8,
    /// Bytes clocked in while sending [`LOOPBACK_PATTERN`]
    pub loopback: [u8; 3],
}

/// Synchronous serial bus to the bias controller.
pub trait SpiBus {
    /// Send one frame.
    fn write(&mut self, frame: &[u8]) -> Result<()>;

    /// Run the identification + loopback exchange.
    fn read_loopback(&mut self) -> Result<LoopbackResponse>;
}

/// Send every setting in order, reading the loopback after each frame.
///
/// Stops at the first failure. Returns the number of frames sent.
pub fn program<B: SpiBus + ?Sized>(bus: &mut B, settings: &[BiasSetting]) -> Result<usize> {
    for (index, setting) in settings.iter().enumerate() {
        let frame = setting.encode();
        bus.write(&frame)?;
        debug!(index, address = setting.address, value = setting.value, frame = ?frame, "Bias frame sent");

        let response = bus.read_loopback()?;
        info!(
            index,
            id = response.id,
            loopback = ?response.loopback,
            "Bias controller response"
        );
    }
    Ok(settings.len())
}
