//! Latest-event register provider

use std::time::Duration;
use tracing::info;

use crate::provider::Provider;
use crate::registers;
use crate::types::EventRecord;
use crate::window::RegisterSource;
use crate::{Result, TelemetryError};

/// Provider that reads the latest-event telemetry registers on every poll.
///
/// The registers always hold the most recent event, so the same record is
/// returned until the FPGA publishes the next one; the driver's deduplicator
/// drops the repeats. Events that come and go between two polls are missed,
/// which is why [`RingProvider`](super::RingProvider) is the default.
pub struct SnapshotProvider<S: RegisterSource> {
    source: S,
    address: u32,
    backoff: Duration,
    polls: u64,
}

impl<S: RegisterSource + 'static> SnapshotProvider<S> {
    pub fn new(source: S, backoff: Duration) -> Result<Self> {
        let address = registers::telemetry_address();
        let last_word = address + (registers::RECORD_WORDS - 1) * registers::WORD_STRIDE;
        if !source.contains(address) || !source.contains(last_word) {
            return Err(TelemetryError::memory_access_error(address as usize));
        }

        info!(
            registers = %format!("{address:#x}"),
            backoff_us = backoff.as_micros() as u64,
            "Snapshot provider ready"
        );

        Ok(Self { source, address, backoff, polls: 0 })
    }

    /// Read the five telemetry registers once.
    pub fn poll_once(&mut self) -> EventRecord {
        self.polls += 1;
        self.source.read_record(self.address)
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

#[async_trait::async_trait]
impl<S: RegisterSource + 'static> Provider for SnapshotProvider<S> {
    async fn next_record(&mut self) -> Result<Option<EventRecord>> {
        if self.polls > 0 {
            super::idle(self.backoff).await;
        }
        Ok(Some(self.poll_once()))
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}
