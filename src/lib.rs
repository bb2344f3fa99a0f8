//! Real-time telemetry logger for the FADS FPGA pipeline.
//!
//! The droplet-sorting firmware publishes one record per detected droplet in a
//! register bank. This crate maps that bank through `/dev/mem`, follows the
//! FPGA's ring buffer, decodes each record into engineering units and writes
//! one line per new event.
//!
//! # Pipeline
//!
//! - [`window`]: read-only register window (`/dev/mem` or simulated)
//! - [`cursor`]: consumer side of the FPGA ring buffer
//! - [`decoder`]: fixed-point conversion to intensity and seconds
//! - [`dedup`]: drops records whose id has not changed
//! - [`sink`]: tab-separated output, flushed per line
//! - [`driver`]: the polling loop tying them together
//!
//! The [`bias`] module holds the companion SPI bias programming utility.
//!
//! # Example (simulated hardware)
//!
//! ```rust
//! use fads_logger::providers::RingProvider;
//! use fads_logger::registers;
//! use fads_logger::sink::LineSink;
//! use fads_logger::types::EventRecord;
//! use fads_logger::window::SimulatedWindow;
//! use fads_logger::Driver;
//! use std::time::Duration;
//!
//! let fpga = SimulatedWindow::new(registers::FADS_BASE, registers::WINDOW_SIZE);
//! let event = EventRecord { id: 1, intensity_raw: -1000, width_raw: 125_000, ..Default::default() };
//! fpga.write_slot(registers::ring_data_address(), 0, &event);
//! fpga.write_u32(registers::ring_head_address(), 1);
//!
//! let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO)?;
//! let record = provider.poll_once().expect("one unread slot");
//!
//! let mut driver = Driver::new(provider, LineSink::new(Vec::new()));
//! assert!(driver.process(&record)?);
//! # Ok::<(), fads_logger::TelemetryError>(())
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Hardware access
pub mod registers;
pub mod window;

// Pipeline stages
pub mod cursor;
pub mod decoder;
pub mod dedup;
pub mod sink;

// Polling loop
pub mod config;
pub mod driver;
pub mod provider;
pub mod providers;

// Companion utility
pub mod bias;

// Core exports
pub use error::*;
pub use types::*;

pub use config::{LoggerConfig, SourceMode};
pub use driver::{Driver, RunSummary};
pub use provider::Provider;
pub use window::{RegisterSource, RegisterWindow, SimulatedWindow};

use providers::{RingProvider, SnapshotProvider};

/// Entry point for connecting to the FADS hardware.
pub struct Fads;

impl Fads {
    /// Map the register window described by `config` and build its provider.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The memory device cannot be opened
    /// - The register window cannot be mapped
    pub fn connect(config: &LoggerConfig) -> Result<Box<dyn Provider>> {
        config.validate()?;

        let window = RegisterWindow::open_path(
            &config.device,
            u64::from(registers::FADS_BASE),
            registers::WINDOW_SIZE,
        )?;
        tracing::info!(
            device = %config.device.display(),
            base = %format!("{:#010x}", window.map_base()),
            source = ?config.source,
            "Connected to FADS register window"
        );

        Self::with_source(window, config)
    }

    /// Build the configured provider over any register source.
    pub fn with_source<S: RegisterSource + 'static>(
        source: S,
        config: &LoggerConfig,
    ) -> Result<Box<dyn Provider>> {
        let backoff = config.idle_backoff();
        Ok(match config.source {
            SourceMode::Ring => Box::new(RingProvider::new(source, backoff)?),
            SourceMode::Snapshot => Box::new(SnapshotProvider::new(source, backoff)?),
        })
    }
}
