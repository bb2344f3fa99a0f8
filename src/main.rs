//! `fads-logger`: stream FADS droplet events to stdout
//!
//! ```bash
//! sudo fads-logger > events.tsv
//! sudo fads-logger --source snapshot --idle-backoff-us 20
//! RUST_LOG=debug sudo fads-logger --config /etc/fads/logger.yaml
//! ```
//!
//! Records go to stdout, one line each; logs go to stderr. The loop runs until
//! SIGINT or SIGTERM, then the register window is released.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use fads_logger::sink::LineSink;
use fads_logger::{Driver, Fads, LoggerConfig, SourceMode, TelemetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fads-logger")]
#[command(about = "Log FADS droplet events from the FPGA register bank", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event source, overrides the configuration file
    #[arg(long, value_enum)]
    source: Option<SourceMode>,

    /// Pause after an empty poll in microseconds, overrides the configuration file
    #[arg(long)]
    idle_backoff_us: Option<u64>,

    /// Memory device, overrides the configuration file
    #[arg(long)]
    device: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => LoggerConfig::default(),
        };

        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(backoff) = self.idle_backoff_us {
            config.idle_backoff_us = backoff;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fads-logger: {:#}", e);
            for suggestion in recovery_hints(&e) {
                debug!(suggestion, "Recovery hint");
            }
            ExitCode::FAILURE
        }
    }
}

/// Hints from the first telemetry error in the chain.
fn recovery_hints(e: &anyhow::Error) -> Vec<&'static str> {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<TelemetryError>())
        .map(TelemetryError::recovery_suggestions)
        .unwrap_or_default()
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let provider = Fads::connect(&config).context("setting up register window")?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    let mut driver = Driver::new(provider, LineSink::new(std::io::stdout().lock()));
    let summary = driver.run(&cancel).await.context("polling loop")?;

    // Dropping the driver releases the register window
    drop(driver);
    info!(emitted = summary.emitted, "Shut down cleanly");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Interrupt received, stopping"),
                    _ = terminate.recv() => info!("Terminate received, stopping"),
                }
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Interrupt received, stopping");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Interrupt received, stopping");
    }

    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_are_found_under_context() {
        let err = Fads::connect(&LoggerConfig {
            device: PathBuf::from("/nonexistent/fads/mem"),
            ..LoggerConfig::default()
        })
        .map(|_| ())
        .context("setting up register window")
        .expect_err("no device");

        let hints = recovery_hints(&err);
        assert!(hints.iter().any(|hint| hint.contains("root")));
    }

    #[test]
    fn foreign_errors_have_no_hints() {
        assert!(recovery_hints(&anyhow::anyhow!("runtime")).is_empty());
    }

    #[test]
    fn flags_override_the_defaults() {
        let cli = Cli::parse_from(["fads-logger", "--source", "snapshot", "--idle-backoff-us", "20"]);
        let config = cli.into_config().expect("config");
        assert_eq!(config.source, SourceMode::Snapshot);
        assert_eq!(config.idle_backoff_us, 20);
    }
}
