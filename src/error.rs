//! Error types for telemetry acquisition and bias programming.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context for diagnostics.
//!
//! ## Error Categories
//!
//! - **Setup Errors**: opening the memory device or mapping the register window.
//!   These are fatal: the logger cannot operate without its window.
//! - **Memory Errors**: register access outside the mapped window
//! - **Output Errors**: the record stream could not be written or flushed
//! - **Config / Parse Errors**: invalid configuration or bias input files
//! - **Bias / SPI Errors**: out-of-range bias values and bus transfer failures
//!
//! ## Recovery
//!
//! Every error is fatal to the run that produced it. Each carries hints for
//! the operator:
//!
//! ```rust
//! use fads_logger::TelemetryError;
//!
//! let error = TelemetryError::spi_error("write", std::io::Error::other("bus busy"));
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```
//!
//! Setup errors record the source location of the call that failed, so the
//! diagnostic printed on exit names where, what, and the OS error:
//!
//! ```rust
//! use fads_logger::TelemetryError;
//!
//! let io_err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
//! let err = TelemetryError::device_open("/dev/mem", io_err);
//! assert!(err.to_string().contains("/dev/mem"));
//! ```

use std::panic::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Failed to open memory device {path} at {location}")]
    DeviceOpen {
        path: PathBuf,
        location: &'static Location<'static>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed to map {size:#x} bytes at physical {base:#010x} from {path} at {location}"
    )]
    Mapping {
        path: PathBuf,
        base: u64,
        size: usize,
        location: &'static Location<'static>,
        #[source]
        source: std::io::Error,
    },

    #[error("Register access outside mapped window at offset {offset:#x}")]
    Memory { offset: usize },

    #[error("Failed to write record stream")]
    Output {
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Bias entry {index} is out of range: address {address}, value {value}")]
    InvalidBias { index: usize, address: i64, value: i64 },

    #[error("SPI operation failed: {operation}")]
    Spi {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl TelemetryError {
    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::DeviceOpen { .. } => vec![
                "Run the logger as root or with CAP_SYS_RAWIO",
                "Check that the kernel exposes /dev/mem",
                "Verify the device path in the configuration",
            ],
            TelemetryError::Mapping { .. } => vec![
                "Check that the FPGA bitstream is loaded",
                "Verify the kernel allows mapping this physical range (CONFIG_STRICT_DEVMEM)",
                "Confirm the firmware revision matches the compiled-in register map",
            ],
            TelemetryError::Memory { .. } => vec![
                "Check register addresses against the mapped window",
                "Rebuild against the register map for this hardware revision",
            ],
            TelemetryError::Output { .. } => vec![
                "Check that the consumer of stdout is still running",
                "Verify free space if stdout is redirected to a file",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Keep the idle backoff below the minimum event interval",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check the input file uses address<TAB>value lines",
                "Remove stray headers or comments from the input file",
            ],
            TelemetryError::InvalidBias { .. } => vec![
                "Bias addresses must be in 1..=6",
                "Bias values must be in 0..=1023",
            ],
            TelemetryError::Spi { .. } => vec![
                "Check that the spidev overlay is loaded",
                "Verify the SPI device path and permissions",
                "Lower the bus speed",
            ],
        }
    }

    /// Helper constructor for device open failures.
    #[track_caller]
    pub fn device_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TelemetryError::DeviceOpen { path: path.into(), location: Location::caller(), source }
    }

    /// Helper constructor for mapping failures.
    #[track_caller]
    pub fn mapping_failed(
        path: impl Into<PathBuf>,
        base: u64,
        size: usize,
        source: std::io::Error,
    ) -> Self {
        TelemetryError::Mapping { path: path.into(), base, size, location: Location::caller(), source }
    }

    /// Helper constructor for memory access errors.
    pub fn memory_access_error(offset: usize) -> Self {
        TelemetryError::Memory { offset }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        TelemetryError::Config { reason: reason.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for SPI errors.
    pub fn spi_error(operation: impl Into<String>, source: std::io::Error) -> Self {
        TelemetryError::Spi { operation: operation.into(), source }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Output { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn messages_carry_their_context(
            offset in 0usize..0x2_0000usize,
            base in 0u64..0xFFFF_FFFFu64,
            index in 0usize..1000usize,
            address in -100i64..100i64,
            value in -5000i64..5000i64,
            details in "\\w+"
          ) {
            let memory_msg = TelemetryError::memory_access_error(offset).to_string();
            let offset_hex = format!("{:#x}", offset);
            prop_assert!(memory_msg.contains(&offset_hex));

            let mapping = TelemetryError::mapping_failed(
                "/dev/mem", base, 0x2_0000, std::io::Error::other("no"));
            let base_hex = format!("{:#010x}", base);
            prop_assert!(mapping.to_string().contains(&base_hex));

            let bias = TelemetryError::InvalidBias { index, address, value };
            let bias_msg = bias.to_string();
            prop_assert!(bias_msg.contains(&index.to_string()));
            prop_assert!(bias_msg.contains(&value.to_string()));

            let parse_msg = TelemetryError::parse_error("bias file", details.clone()).to_string();
            prop_assert!(parse_msg.contains(&details));
          }
        }
    }

    #[test]
    fn setup_errors_record_caller_location_and_os_error() {
        let err = TelemetryError::device_open(
            "/dev/mem",
            std::io::Error::from_raw_os_error(13), // EACCES
        );

        let msg = err.to_string();
        assert!(msg.contains(file!()), "location missing from {msg}");
        assert!(msg.contains("/dev/mem"));

        let source = err.source().expect("io source");
        assert!(source.to_string().contains("os error 13"));
    }

    #[test]
    fn hex_fields_render_in_messages() {
        let memory = TelemetryError::memory_access_error(0x1_0014).to_string();
        assert!(memory.contains("0x10014"), "{memory}");

        let mapping =
            TelemetryError::mapping_failed("/dev/mem", 0x4060_0000, 0x2_0000, std::io::Error::other("x"));
        let msg = mapping.to_string();
        assert!(msg.contains("0x40600000"), "{msg}");
        assert!(msg.contains("0x20000"), "{msg}");
    }

    #[test]
    fn setup_errors_point_at_privileges_and_bitstream() {
        let open = TelemetryError::device_open("/dev/mem", std::io::Error::other("x"));
        let map = TelemetryError::mapping_failed("/dev/mem", 0, 4096, std::io::Error::other("x"));
        assert!(open.recovery_suggestions().iter().any(|s| s.contains("root")));
        assert!(map.recovery_suggestions().iter().any(|s| s.contains("bitstream")));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();
    }

    #[test]
    fn recovery_suggestions_are_descriptive() {
        let errors = [
            TelemetryError::memory_access_error(0x1000),
            TelemetryError::config_error("bad"),
            TelemetryError::parse_error("bias file", "line 3: missing value"),
        ];
        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn io_errors_convert_to_output() {
        let err: TelemetryError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, TelemetryError::Output { .. }));
    }
}
