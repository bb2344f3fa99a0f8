//! Event providers backed by a register window
//!
//! - [`RingProvider`] drains the FPGA ring buffer in producer order
//! - [`SnapshotProvider`] samples the latest-event registers on every poll

mod ring;
mod snapshot;

pub use ring::RingProvider;
pub use snapshot::SnapshotProvider;

use std::time::Duration;

/// Upper bound for the idle backoff. Events can arrive every few
/// microseconds, so anything longer risks overrunning the ring.
pub const MAX_IDLE_BACKOFF: Duration = Duration::from_micros(100);

/// Wait between two polls that found nothing new.
///
/// A zero backoff only yields to the runtime, keeping the busy-poll cadence
/// while still letting the shutdown signal be observed. Tokio timers have
/// millisecond resolution, so shorter backoffs sleep the thread directly.
pub(crate) async fn idle(backoff: Duration) {
    if backoff >= TIMER_RESOLUTION {
        tokio::time::sleep(backoff).await;
        return;
    }
    if !backoff.is_zero() {
        // Blocks the runtime, signal task included, for under a millisecond
        std::thread::sleep(backoff);
    }
    tokio::task::yield_now().await;
}

/// Shortest wait handed to the tokio timer.
const TIMER_RESOLUTION: Duration = Duration::from_millis(1);
