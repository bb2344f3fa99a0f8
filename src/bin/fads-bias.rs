//! `fads-bias`: program the detector bias DAC over SPI
//!
//! ```bash
//! fads-bias bias_values.tsv
//! fads-bias --device /dev/spidev1.0 --speed-hz 500000 bias_values.tsv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fads_logger::{TelemetryError, bias};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fads-bias")]
#[command(about = "Send bias settings to the FADS bias controller", long_about = None)]
struct Cli {
    /// Table of address<TAB>value lines
    #[arg(default_value = "bias_values.tsv")]
    table: PathBuf,

    /// SPI device of the bias controller
    #[arg(long, default_value = bias::DEFAULT_SPI_DEVICE)]
    device: PathBuf,

    /// SPI clock in Hz
    #[arg(long, default_value_t = bias::DEFAULT_SPEED_HZ)]
    speed_hz: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let result = run(&Cli::parse());
    if let Err(e) = &result {
        for suggestion in recovery_hints(e) {
            debug!(suggestion, "Recovery hint");
        }
    }
    result
}

fn run(cli: &Cli) -> Result<()> {
    let settings = bias::load_bias_table(&cli.table)
        .with_context(|| format!("reading {}", cli.table.display()))?;
    info!(entries = settings.len(), "Bias table validated");

    let sent = transmit(cli, &settings)?;
    info!(sent, "Bias programming complete");
    Ok(())
}

/// Hints from the first telemetry error in the chain.
fn recovery_hints(e: &anyhow::Error) -> Vec<&'static str> {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<TelemetryError>())
        .map(TelemetryError::recovery_suggestions)
        .unwrap_or_default()
}

#[cfg(target_os = "linux")]
fn transmit(cli: &Cli, settings: &[bias::BiasSetting]) -> Result<usize> {
    let mut bus = bias::SpiDev::open(&cli.device, cli.speed_hz)
        .with_context(|| format!("opening {}", cli.device.display()))?;
    Ok(bias::program(&mut bus, settings)?)
}

#[cfg(not(target_os = "linux"))]
fn transmit(_cli: &Cli, _settings: &[bias::BiasSetting]) -> Result<usize> {
    anyhow::bail!("SPI bias programming requires Linux spidev")
}
