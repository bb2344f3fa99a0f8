//! Line-oriented output of decoded samples

use std::io::Write;

use crate::types::DecodedSample;
use crate::{Result, TelemetryError};

/// Writes one tab-separated line per sample and flushes after each line.
///
/// Field order: id, raw intensity, intensity, raw width, width (s),
/// classification, timestamp. No header is written.
#[derive(Debug)]
pub struct LineSink<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Write `sample` and flush it through to the consumer.
    pub fn emit(&mut self, sample: &DecodedSample) -> Result<()> {
        writeln!(
            self.out,
            "{:>12}\t{:>12}\t{:.6}\t{:>12}\t{:.6}\t{:>3}\t{:>12}",
            sample.id,
            sample.intensity_raw,
            sample.intensity,
            sample.width_raw,
            sample.width,
            sample.classification,
            sample.timestamp,
        )
        .and_then(|()| self.out.flush())
        .map_err(|source| TelemetryError::Output { source })?;

        self.lines += 1;
        Ok(())
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::types::EventRecord;

    /// Writer that counts flushes
    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
        flushes: usize,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn formats_fields_in_fixed_order() {
        let sample = decode(&EventRecord::from_words([42, (-1000i32) as u32, 125_000, 2, 9001]));
        let mut sink = LineSink::new(Vec::new());
        sink.emit(&sample).expect("write to vec");

        let line = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(
            line,
            "          42\t       -1000\t-2.441406\t      125000\t1.000000\t  2\t        9001\n"
        );
    }

    #[test]
    fn flushes_every_line() {
        let sample = decode(&EventRecord::default());
        let mut sink = LineSink::new(Recorder::default());
        sink.emit(&sample).expect("emit");
        sink.emit(&sample).expect("emit");

        assert_eq!(sink.get_ref().flushes, 2);
        assert_eq!(sink.lines(), 2);
        let text = String::from_utf8(sink.get_ref().bytes.clone()).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.lines().next().map(|l| l.split('\t').count()), Some(7));
    }

    #[test]
    fn write_failures_surface_as_output_errors() {
        let mut sink = LineSink::new(ClosedPipe);
        let err = sink.emit(&decode(&EventRecord::default())).expect_err("pipe is closed");
        assert!(matches!(err, TelemetryError::Output { .. }));
        assert_eq!(sink.lines(), 0);
    }
}
