//! Fixed-point decoding of raw event records

use crate::types::{DecodedSample, EventRecord};

/// Calibration from raw intensity counts to intensity units (about 2^-9).
pub const INTENSITY_SCALE: f64 = 0.002441406;

/// FPGA sample clock in samples per second.
pub const SAMPLE_RATE: f64 = 125_000.0;

/// Convert a raw record into engineering units.
///
/// Every bit pattern is a valid input.
#[inline]
pub fn decode(raw: &EventRecord) -> DecodedSample {
    DecodedSample {
        id: raw.id,
        intensity_raw: raw.intensity_raw,
        intensity: f64::from(raw.intensity_raw) * INTENSITY_SCALE,
        width_raw: raw.width_raw,
        width: f64::from(raw.width_raw) / SAMPLE_RATE,
        classification: raw.classification,
        timestamp: raw.timestamp_raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(intensity_word: u32, width_raw: u32) -> EventRecord {
        EventRecord::from_words([1, intensity_word, width_raw, 3, 77])
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn intensity_sign_follows_raw_sign(word in any::<u32>()) {
            let sample = decode(&record(word, 0));
            let signed = word as i32;
            prop_assert_eq!(sample.intensity < 0.0, signed < 0);
            prop_assert!(sample.intensity.is_finite());
          }

          #[test]
          fn width_is_never_negative(width in any::<u32>()) {
            let sample = decode(&record(0, width));
            prop_assert!(sample.width >= 0.0);
          }
        }
    }

    #[test]
    fn negative_intensity_is_sign_extended_before_scaling() {
        let sample = decode(&record((-1000i32) as u32, 0));
        assert_eq!(sample.intensity_raw, -1000);
        assert!((sample.intensity - (-2.441406)).abs() < 1e-9);
    }

    #[test]
    fn one_second_of_samples_decodes_to_one_second() {
        let sample = decode(&record(0, 125_000));
        assert_eq!(sample.width, 1.0);
    }

    #[test]
    fn width_uses_the_full_unsigned_range() {
        let sample = decode(&record(0, u32::MAX));
        assert!((sample.width - f64::from(u32::MAX) / SAMPLE_RATE).abs() < 1e-6);
    }

    #[test]
    fn classification_and_timestamp_pass_through() {
        let raw = EventRecord::from_words([9, 0, 0, 0xABCD, 0xFFFF_FFFF]);
        let sample = decode(&raw);
        assert_eq!(sample.id, 9);
        assert_eq!(sample.classification, 0xABCD);
        assert_eq!(sample.timestamp, 0xFFFF_FFFF);
    }
}
