//! Linux spidev transport

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{LOOPBACK_PATTERN, LoopbackResponse, RDID_COMMAND, SpiBus};
use crate::{Result, TelemetryError};

/// Mirror of the kernel's `struct spi_ioc_transfer`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)] // read by the kernel
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    pad: u8,
}

mod ioctl {
    use super::SpiIocTransfer;

    const SPI_IOC_MAGIC: u8 = b'k';

    nix::ioctl_write_ptr!(spi_write_mode, SPI_IOC_MAGIC, 1, u8);
    nix::ioctl_write_ptr!(spi_write_max_speed_hz, SPI_IOC_MAGIC, 4, u32);
    nix::ioctl_write_buf!(spi_message, SPI_IOC_MAGIC, 0, SpiIocTransfer);
}

/// SPI mode 0: CPOL = 0, CPHA = 0.
const SPI_MODE_0: u8 = 0;

/// Bias controller attached to a spidev character device.
pub struct SpiDev {
    file: File,
    path: PathBuf,
    speed_hz: u32,
}

impl SpiDev {
    /// Open the device and configure mode 0 at `speed_hz`.
    pub fn open(path: impl AsRef<Path>, speed_hz: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TelemetryError::spi_error(format!("open {}", path.display()), e))?;

        let fd = file.as_raw_fd();
        // SAFETY: fd is a live descriptor and the pointers outlive the calls.
        unsafe { ioctl::spi_write_mode(fd, &SPI_MODE_0) }
            .map_err(|e| TelemetryError::spi_error("set mode", e.into()))?;
        unsafe { ioctl::spi_write_max_speed_hz(fd, &speed_hz) }
            .map_err(|e| TelemetryError::spi_error("set max speed", e.into()))?;

        debug!(path = %path.display(), speed_hz, "SPI device configured");
        Ok(Self { file, path: path.to_path_buf(), speed_hz })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }
}

impl SpiBus for SpiDev {
    fn write(&mut self, frame: &[u8]) -> Result<()> {
        self.file.write_all(frame).map_err(|e| TelemetryError::spi_error("write frame", e))
    }

    fn read_loopback(&mut self) -> Result<LoopbackResponse> {
        let mut command = [RDID_COMMAND];
        let mut pattern = LOOPBACK_PATTERN;

        let transfers = [
            SpiIocTransfer {
                tx_buf: command.as_mut_ptr() as u64,
                rx_buf: command.as_mut_ptr() as u64,
                len: command.len() as u32,
                ..SpiIocTransfer::default()
            },
            SpiIocTransfer {
                tx_buf: pattern.as_mut_ptr() as u64,
                rx_buf: pattern.as_mut_ptr() as u64,
                len: pattern.len() as u32,
                ..SpiIocTransfer::default()
            },
        ];

        // SAFETY: both buffers stay alive and unmoved until the ioctl returns;
        // the kernel writes at most `len` bytes into each.
        unsafe { ioctl::spi_message(self.file.as_raw_fd(), &transfers) }
            .map_err(|e| TelemetryError::spi_error("identification exchange", e.into()))?;

        Ok(LoopbackResponse { id: command[0], loopback: pattern })
    }
}
