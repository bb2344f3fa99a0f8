//! Test utilities shared by unit tests and benchmarks
//!
//! Fixtures for simulated register banks and helpers for checking that
//! device handles are released.

#![cfg(any(test, feature = "benchmark"))]

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::registers::{FADS_BASE, WINDOW_SIZE};
use crate::types::EventRecord;
use crate::window::SimulatedWindow;

/// An empty register bank covering the real FADS window.
pub fn simulated_bank() -> SimulatedWindow {
    SimulatedWindow::new(FADS_BASE, WINDOW_SIZE)
}

/// A record whose fields are derived from `id`, so ordering mistakes show up.
pub fn record(id: u32) -> EventRecord {
    EventRecord {
        id,
        intensity_raw: (id as i32).wrapping_mul(-100),
        width_raw: id.wrapping_mul(125),
        classification: id % 4,
        timestamp_raw: id.wrapping_add(1_000),
    }
}

/// Write `bytes` to a per-process scratch file and return its path.
pub fn scratch_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("fads-{}-{}.bin", name, std::process::id()));
    std::fs::write(&path, bytes).expect("write scratch file");
    path
}

/// Targets of every file descriptor this process holds open.
#[cfg(target_os = "linux")]
pub fn fd_targets() -> Vec<PathBuf> {
    std::fs::read_dir("/proc/self/fd")
        .map(|entries| entries.flatten().filter_map(|entry| std::fs::read_link(entry.path()).ok()).collect())
        .unwrap_or_default()
}

/// Cloneable in-memory writer, for reading a sink's output while a driver
/// owns it.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
    }

    pub fn line_count(&self) -> usize {
        self.contents().lines().count()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
