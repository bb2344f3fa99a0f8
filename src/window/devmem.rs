//! Physical register window mapped through `/dev/mem`

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tracing::{debug, trace};

use super::{RegisterSource, window_offset};
use crate::registers::{DEV_MEM, WORD_STRIDE};
use crate::{Result, TelemetryError};

/// Read-only shared mapping of a physical register range.
///
/// The window owns both the mapping and the device handle. Dropping it unmaps
/// first and closes the handle second; this happens on every exit path,
/// including a setup that fails halfway.
pub struct RegisterWindow {
    // Field order is drop order: unmap before close.
    mmap: Mmap,
    _file: File,
    path: PathBuf,
    map_base: u64,
    size: usize,
}

impl RegisterWindow {
    /// Map `window_size` bytes of physical memory around `physical_base`
    /// through `/dev/mem`.
    pub fn open(physical_base: u32, window_size: usize) -> Result<Self> {
        Self::open_path(DEV_MEM, u64::from(physical_base), window_size)
    }

    /// Map a window from an explicit memory device.
    ///
    /// `physical_base` is aligned down to `window_size`, which must be a
    /// power of two.
    pub fn open_path(
        path: impl AsRef<Path>,
        physical_base: u64,
        window_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();

        if !window_size.is_power_of_two() || window_size < WORD_STRIDE as usize {
            return Err(TelemetryError::mapping_failed(
                path,
                physical_base,
                window_size,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "window size must be a power of two of at least one word",
                ),
            ));
        }

        let map_base = physical_base & !((window_size as u64) - 1);
        trace!(path = %path.display(), map_base, window_size, "Opening register window");

        let file = File::open(path).map_err(|e| TelemetryError::device_open(path, e))?;

        // SAFETY: the mapping is read-only and shared. The hardware may change
        // the contents at any time; all reads go through `read_u32`, which
        // uses volatile loads and never forms references into the mapping.
        let mmap = unsafe { MmapOptions::new().offset(map_base).len(window_size).map(&file) }
            .map_err(|e| TelemetryError::mapping_failed(path, map_base, window_size, e))?;

        debug!(path = %path.display(), map_base, window_size, "Register window mapped");

        Ok(Self { mmap, _file: file, path: path.to_path_buf(), map_base, size: window_size })
    }

    /// Physical address of the first mapped byte.
    pub fn map_base(&self) -> u64 {
        self.map_base
    }

    /// Size of the mapping in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Device the window was mapped from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterSource for RegisterWindow {
    #[inline]
    fn read_u32(&self, address: u32) -> u32 {
        let offset = window_offset(address, self.size);
        // SAFETY: `offset` is word aligned and at most `size - 4`, the mapping
        // is page aligned and lives as long as `self`.
        unsafe { std::ptr::read_volatile(self.mmap.as_ptr().add(offset).cast::<u32>()) }
    }

    fn contains(&self, address: u32) -> bool {
        let address = u64::from(address);
        address >= self.map_base && address + u64::from(WORD_STRIDE) <= self.map_base + self.size as u64
    }
}

impl Drop for RegisterWindow {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), map_base = self.map_base, "Releasing register window");
    }
}

impl std::fmt::Debug for RegisterWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterWindow")
            .field("path", &self.path)
            .field("map_base", &format_args!("{:#x}", self.map_base))
            .field("size", &format_args!("{:#x}", self.size))
            .finish()
    }
}
