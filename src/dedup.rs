//! Suppression of repeated event ids
//!
//! The FPGA bumps the event id once per droplet. Reading faster than events
//! arrive shows the same id again and again; only the first sighting is
//! emitted. Gaps in the id sequence are not reported.

/// Remembers the last observed event id.
#[derive(Debug, Clone, Default)]
pub struct ChangeDeduplicator {
    last_seen: Option<u32>,
    emitted: u64,
    suppressed: u64,
}

impl ChangeDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation of `id` and report whether it is new.
    ///
    /// Nothing has been seen before the first call, so id 0 is emitted like
    /// any other first id.
    pub fn should_emit(&mut self, id: u32) -> bool {
        let fresh = self.last_seen != Some(id);
        self.last_seen = Some(id);

        if fresh {
            self.emitted += 1;
        } else {
            self.suppressed += 1;
        }
        fresh
    }

    pub fn last_seen(&self) -> Option<u32> {
        self.last_seen
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}
