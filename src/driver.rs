//! Driver runs the polling loop
//!
//! The driver is the single owned context of a logging run: it holds the
//! provider (and through it the register window and ring cursor), the
//! deduplicator and the output sink. Nothing is shared or global.

use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::cursor::CursorStats;
use crate::decoder::decode;
use crate::dedup::ChangeDeduplicator;
use crate::provider::Provider;
use crate::sink::LineSink;
use crate::types::EventRecord;
use crate::Result;

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records returned by the provider
    pub records: u64,
    /// Records written to the sink
    pub emitted: u64,
    /// Records dropped as repeats
    pub suppressed: u64,
    /// Ring consumption, when the provider tracks a cursor
    pub cursor: Option<CursorStats>,
}

/// Polling loop context: provider → decoder → deduplicator → sink.
pub struct Driver<P: Provider, W: Write> {
    provider: P,
    dedup: ChangeDeduplicator,
    sink: LineSink<W>,
    records: u64,
}

impl<P: Provider, W: Write> Driver<P, W> {
    pub fn new(provider: P, sink: LineSink<W>) -> Self {
        Self { provider, dedup: ChangeDeduplicator::new(), sink, records: 0 }
    }

    /// Decode one record and emit it unless its id was just seen.
    ///
    /// Returns whether a line was written.
    pub fn process(&mut self, record: &EventRecord) -> Result<bool> {
        self.records += 1;
        let sample = decode(record);

        if !self.dedup.should_emit(sample.id) {
            trace!(id = sample.id, "Repeated event id, not emitted");
            return Ok(false);
        }

        self.sink.emit(&sample)?;
        Ok(true)
    }

    /// Poll until `cancel` fires or the provider ends.
    ///
    /// Provider and output errors end the run immediately; nothing is retried.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        info!(provider = self.provider.name(), "Polling loop started");

        loop {
            if cancel.is_cancelled() {
                info!("Polling loop cancelled");
                break;
            }

            // Select so cancellation also interrupts a provider waiting for data
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Polling loop cancelled while waiting for data");
                    break;
                }
                result = self.provider.next_record() => result,
            };

            match result {
                Ok(Some(record)) => {
                    self.process(&record)?;
                }
                Ok(None) => {
                    info!(records = self.records, "Provider ended");
                    break;
                }
                Err(e) => {
                    error!("Provider failed: {}", e);
                    return Err(e);
                }
            }
        }

        let summary = self.summary();
        info!(
            records = summary.records,
            emitted = summary.emitted,
            suppressed = summary.suppressed,
            "Polling loop ended"
        );
        if let Some(stats) = summary.cursor {
            debug!(
                polls = stats.polls,
                idle_polls = stats.idle_polls,
                consumed = stats.consumed,
                max_backlog = stats.max_backlog,
                saturated_polls = stats.saturated_polls,
                "Ring cursor statistics"
            );
        }
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            records: self.records,
            emitted: self.dedup.emitted(),
            suppressed: self.dedup.suppressed(),
            cursor: self.provider.cursor_stats(),
        }
    }

    pub fn sink(&self) -> &LineSink<W> {
        &self.sink
    }

    /// Tear the driver down, returning the provider and sink.
    pub fn into_parts(self) -> (P, LineSink<W>) {
        (self.provider, self.sink)
    }
}
