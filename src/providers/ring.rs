//! Ring buffer provider

use std::time::Duration;
use tracing::{debug, info};

use crate::cursor::{CursorStats, RingCursor};
use crate::provider::Provider;
use crate::registers;
use crate::types::EventRecord;
use crate::window::RegisterSource;
use crate::{Result, TelemetryError};

/// Provider that consumes the FPGA ring buffer slot by slot.
///
/// Every unread slot is returned, oldest first, one per call. When the ring is
/// empty the provider waits the idle backoff and polls the head again.
pub struct RingProvider<S: RegisterSource> {
    source: S,
    cursor: RingCursor,
    backoff: Duration,
}

impl<S: RegisterSource + 'static> RingProvider<S> {
    /// Create a provider over the compiled-in ring geometry.
    pub fn new(source: S, backoff: Duration) -> Result<Self> {
        let cursor = RingCursor::new(
            registers::ring_head_address(),
            registers::ring_data_address(),
            registers::RING_LENGTH,
            registers::SLOT_PITCH,
        )?;
        Self::with_cursor(source, cursor, backoff)
    }

    /// Create a provider with an explicit cursor.
    pub fn with_cursor(source: S, cursor: RingCursor, backoff: Duration) -> Result<Self> {
        let last_word = (cursor.length() - 1)
            .checked_mul(cursor.slot_pitch())
            .and_then(|span| span.checked_add((registers::RECORD_WORDS - 1) * registers::WORD_STRIDE))
            .and_then(|span| cursor.data_address().checked_add(span))
            .ok_or_else(|| TelemetryError::memory_access_error(cursor.data_address() as usize))?;

        for address in [cursor.head_address(), cursor.data_address(), last_word] {
            if !source.contains(address) {
                return Err(TelemetryError::memory_access_error(address as usize));
            }
        }

        info!(
            length = cursor.length(),
            head_register = %format!("{:#x}", cursor.head_address()),
            backoff_us = backoff.as_micros() as u64,
            "Ring buffer provider ready"
        );

        Ok(Self { source, cursor, backoff })
    }

    /// Poll the head once and read the oldest unread slot, if any.
    pub fn poll_once(&mut self) -> Option<EventRecord> {
        if self.cursor.poll_fill(&self.source) == 0 {
            return None;
        }

        let address = self.cursor.next_slot_address();
        let record = self.source.read_record(address);
        debug!(slot = self.cursor.tail(), id = record.id, "Consumed ring slot");
        self.cursor.consume();
        Some(record)
    }

    pub fn cursor(&self) -> &RingCursor {
        &self.cursor
    }
}

#[async_trait::async_trait]
impl<S: RegisterSource + 'static> Provider for RingProvider<S> {
    async fn next_record(&mut self) -> Result<Option<EventRecord>> {
        loop {
            if let Some(record) = self.poll_once() {
                return Ok(Some(record));
            }
            super::idle(self.backoff).await;
        }
    }

    fn name(&self) -> &'static str {
        "ring"
    }

    fn cursor_stats(&self) -> Option<CursorStats> {
        Some(self.cursor.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{record, simulated_bank};

    #[test]
    fn stalled_head_yields_nothing() {
        let fpga = simulated_bank();
        let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO).expect("provider");

        assert_eq!(provider.poll_once(), None);
        assert_eq!(provider.poll_once(), None);
        assert_eq!(provider.cursor().tail(), 0);
    }

    #[test]
    fn backlog_is_drained_in_producer_order() {
        let fpga = simulated_bank();
        let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO).expect("provider");

        for slot in 0..4 {
            fpga.write_slot(registers::ring_data_address(), slot, &record(100 + slot));
        }
        fpga.write_u32(registers::ring_head_address(), 4);

        let ids: Vec<u32> = std::iter::from_fn(|| provider.poll_once()).map(|r| r.id).collect();
        assert_eq!(ids, vec![100, 101, 102, 103]);
        assert_eq!(provider.cursor().stats().consumed, 4);
    }

    #[test]
    fn reading_wraps_around_the_ring_end() {
        let fpga = simulated_bank();
        let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO).expect("provider");
        let data = registers::ring_data_address();

        // Walk the consumer to slot 14
        fpga.write_u32(registers::ring_head_address(), 14);
        while provider.poll_once().is_some() {}
        assert_eq!(provider.cursor().tail(), 14);

        fpga.write_slot(data, 14, &record(14));
        fpga.write_slot(data, 15, &record(15));
        fpga.write_slot(data, 0, &record(16));
        // Free-running head counter past the ring end
        fpga.write_u32(registers::ring_head_address(), 17);

        let ids: Vec<u32> = std::iter::from_fn(|| provider.poll_once()).map(|r| r.id).collect();
        assert_eq!(ids, vec![14, 15, 16]);
        assert_eq!(provider.cursor().tail(), 1);
    }

    #[test]
    fn rejects_a_window_that_misses_the_ring() {
        let small = crate::window::SimulatedWindow::new(registers::FADS_BASE, 0x1000);
        let err = RingProvider::new(small, Duration::ZERO).err().expect("ring outside window");
        assert!(matches!(err, TelemetryError::Memory { .. }));
    }

    #[tokio::test]
    async fn next_record_waits_for_the_producer() {
        let fpga = simulated_bank();
        let mut provider = RingProvider::new(fpga.clone(), Duration::ZERO).expect("provider");

        let producer = {
            let fpga = fpga.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                fpga.write_slot(registers::ring_data_address(), 0, &record(7));
                fpga.write_u32(registers::ring_head_address(), 1);
            })
        };

        let next = tokio::time::timeout(Duration::from_secs(2), provider.next_record())
            .await
            .expect("record before timeout")
            .expect("no provider error");
        assert_eq!(next.map(|r| r.id), Some(7));
        producer.await.expect("producer task");
    }
}
