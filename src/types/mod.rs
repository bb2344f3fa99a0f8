//! Core types for FADS telemetry.
//!
//! - [`EventRecord`] is the raw five-word record exactly as the FPGA writes it
//! - [`DecodedSample`] is the same event in engineering units, ready for output
//!
//! ```rust
//! use fads_logger::types::EventRecord;
//!
//! let record = EventRecord::from_words([42, (-1000i32) as u32, 125_000, 2, 9001]);
//! assert_eq!(record.intensity_raw, -1000);
//! ```

mod record;

pub use record::{DecodedSample, EventRecord};
