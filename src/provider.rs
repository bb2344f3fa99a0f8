//! Provider trait for event sources

use crate::Result;
use crate::cursor::CursorStats;
use crate::types::EventRecord;

/// Trait for telemetry event sources
///
/// Providers own their register window and handle polling cadence
/// internally, so the driver only ever asks for the next record.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next raw event record
    ///
    /// Returns:
    /// - `Ok(Some(record))` - A record was read
    /// - `Ok(None)` - Source ended (never happens for live hardware)
    /// - `Err(e)` - Error occurred
    ///
    /// Waiting for new data happens inside this call, between polls.
    async fn next_record(&mut self) -> Result<Option<EventRecord>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Ring consumption counters, for providers that track a cursor
    fn cursor_stats(&self) -> Option<CursorStats> {
        None
    }
}

#[async_trait::async_trait]
impl<P: Provider + ?Sized> Provider for Box<P> {
    async fn next_record(&mut self) -> Result<Option<EventRecord>> {
        (**self).next_record().await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn cursor_stats(&self) -> Option<CursorStats> {
        (**self).cursor_stats()
    }
}
