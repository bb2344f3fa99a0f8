//! End-to-end pipeline tests against a simulated register bank.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fads_logger::decoder::decode;
use fads_logger::providers::RingProvider;
use fads_logger::registers;
use fads_logger::sink::LineSink;
use fads_logger::{Driver, EventRecord, Fads, LoggerConfig, Provider, SimulatedWindow, SourceMode};
use tokio_util::sync::CancellationToken;

fn bank() -> SimulatedWindow {
    SimulatedWindow::new(registers::FADS_BASE, registers::WINDOW_SIZE)
}

fn event(id: u32, intensity_raw: i32, width_raw: u32) -> EventRecord {
    EventRecord { id, intensity_raw, width_raw, classification: id % 3, timestamp_raw: 40_000 + id }
}

fn expected_line(record: &EventRecord) -> String {
    let mut sink = LineSink::new(Vec::new());
    sink.emit(&decode(record)).expect("in-memory sink");
    String::from_utf8(sink.into_inner()).expect("utf8")
}

/// Writer whose contents stay readable while a driver owns a clone.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("lock").clone()).expect("utf8")
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn head_advances_are_logged_once_in_order() {
    let fpga = bank();
    let a = event(7, -1000, 125_000);
    let b = event(8, 2048, 250);

    let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO).expect("provider");
    let mut seen = Vec::new();

    // Head 0: nothing to read
    assert!(provider.poll_once().is_none());

    fpga.write_slot(registers::ring_data_address(), 0, &a);
    fpga.write_u32(registers::ring_head_address(), 1);
    seen.extend(provider.poll_once());

    // Head unchanged: nothing new
    assert!(provider.poll_once().is_none());

    fpga.write_slot(registers::ring_data_address(), 1, &b);
    fpga.write_u32(registers::ring_head_address(), 2);
    seen.extend(provider.poll_once());
    assert!(provider.poll_once().is_none());

    let mut driver = Driver::new(provider, LineSink::new(Vec::new()));
    for record in &seen {
        assert!(driver.process(record).expect("process"));
    }

    let (_, sink) = driver.into_parts();
    let output = String::from_utf8(sink.into_inner()).expect("utf8");
    assert_eq!(output, format!("{}{}", expected_line(&a), expected_line(&b)));
    assert!(output.starts_with("           7\t       -1000\t-2.441406\t      125000\t1.000000\t  1\t       40007\n"));
}

#[test]
fn burst_larger_than_one_poll_is_drained_in_order() {
    let fpga = bank();
    let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO).expect("provider");

    for i in 0..14 {
        fpga.write_slot(registers::ring_data_address(), i, &event(100 + i, 0, 0));
    }
    fpga.write_u32(registers::ring_head_address(), 14);
    let first: Vec<u32> = std::iter::from_fn(|| provider.poll_once()).map(|r| r.id).collect();
    assert_eq!(first, (100..114).collect::<Vec<_>>());

    // Head 14 -> 19 wraps past the last slot
    for (i, slot) in (14..19u32).map(|i| (i, i % registers::RING_LENGTH)) {
        fpga.write_slot(registers::ring_data_address(), slot, &event(200 + i, 0, 0));
    }
    fpga.write_u32(registers::ring_head_address(), 19);

    let second: Vec<u32> = std::iter::from_fn(|| provider.poll_once()).map(|r| r.id).collect();
    assert_eq!(second, (214..219).collect::<Vec<_>>());
    assert_eq!(provider.cursor().tail(), 19 % registers::RING_LENGTH);
}

#[tokio::test]
async fn configured_snapshot_source_suppresses_repeats() {
    let fpga = bank();
    fpga.write_record(registers::telemetry_address(), &event(0, 5, 5));

    let config = LoggerConfig { source: SourceMode::Snapshot, ..LoggerConfig::default() };
    let provider = Fads::with_source(fpga.clone(), &config).expect("provider");
    assert_eq!(provider.name(), "snapshot");

    let out = Captured::default();
    let mut driver = Driver::new(provider, LineSink::new(out.clone()));

    let cancel = CancellationToken::new();
    let producer = {
        let cancel = cancel.clone();
        let out = out.clone();
        tokio::spawn(async move {
            // The first id is 0 and must still be logged
            while out.text().lines().count() < 1 {
                tokio::task::yield_now().await;
            }
            fpga.write_record(registers::telemetry_address(), &event(1, 6, 6));
            while out.text().lines().count() < 2 {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        })
    };

    let summary = tokio::time::timeout(Duration::from_secs(5), driver.run(&cancel))
        .await
        .expect("producer finishes")
        .expect("run");
    producer.await.expect("producer task");

    assert_eq!(summary.emitted, 2);
    assert_eq!(
        out.text(),
        format!("{}{}", expected_line(&event(0, 5, 5)), expected_line(&event(1, 6, 6)))
    );
}
