// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod device;
mod radio_handle;
mod radio_task;
mod reconcile;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use ap_app::{init_logging, ConfigFile};
use ap_backend::builtin_backends;
use ap_core::radio::controller::RadioListener;
use ap_core::radio::credentials::RandomSalt;
use ap_core::{ConfigurationRequest, DynResult, RadioState, RadioStatus, Station, StationStatus};

use config::ServerConfig;
use device::RadioDevice;
use radio_handle::RadioHandle;
use radio_task::{run_radio_task, RadioTaskConfig};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - access point radio daemon");
const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Device backend to use (openwrt, dummy)
    #[arg(short = 'b', long = "backend")]
    backend: Option<String>,
    /// Configuration request (JSON) to submit once the radio task runs
    #[arg(long = "request", value_name = "FILE")]
    request: Option<PathBuf>,
}

/// Software version from the version file, `unknown` when unreadable.
fn read_version(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        Ok(_) => UNKNOWN_VERSION.to_string(),
        Err(e) => {
            warn!("Could not read version file {}: {}", path.display(), e);
            UNKNOWN_VERSION.to_string()
        }
    }
}

fn read_request(path: &Path) -> DynResult<ConfigurationRequest> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read request file {}: {}", path.display(), e))?;
    let request = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse request file {}: {}", path.display(), e))?;
    Ok(request)
}

/// Logs radio status transitions and station assignment changes.
struct LoggingListener;

impl RadioListener for LoggingListener {
    fn on_status_change(&self, old: RadioStatus, new: RadioStatus) {
        if new == RadioStatus::Error {
            error!("Radio status {} -> {}", old, new);
        } else {
            info!("Radio status {} -> {}", old, new);
        }
    }

    fn on_station_assigned(&self, station: Station, status: &StationStatus) {
        info!("Station {} now broadcasting '{}'", station, status.ssid);
    }

    fn on_station_cleared(&self, station: Station) {
        info!("Station {} cleared", station);
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let registry = builtin_backends();
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (mut cfg, config_path) = ServerConfig::load(cli.config.as_deref())?;
    if let Some(ref backend) = cli.backend {
        cfg.device.backend = backend.to_ascii_lowercase();
    }
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }
    if !registry.is_backend_registered(&cfg.device.backend) {
        return Err(format!(
            "Unknown device backend: {} (available: {})",
            cfg.device.backend,
            registry.registered_backends().join(", ")
        )
        .into());
    }
    info!("Starting ap-server (backend: {})", cfg.device.backend);

    let backend = registry.build_backend(&cfg.device.backend, &cfg.backend_options())?;
    let device = RadioDevice::detect(backend.store, backend.shell, Box::new(RandomSalt)).await?;

    let version = read_version(Path::new(&cfg.general.version_file));
    info!("Software version {}", version);

    let (request_tx, request_rx) = mpsc::channel(cfg.behavior.request_queue_size);
    let (state_tx, state_rx) = watch::channel(RadioState::new(device.profile(), version));
    let handle = RadioHandle::new(request_tx, state_rx);

    let task_config = RadioTaskConfig {
        boot_polling: cfg.behavior.boot_polling(),
        polling: Box::new(cfg.behavior.status_polling()),
        timing: cfg.behavior.reconcile_timing(),
        listeners: vec![Arc::new(LoggingListener)],
    };
    let mut task = tokio::spawn(run_radio_task(task_config, device, request_rx, state_tx));

    if let Some(ref path) = cli.request {
        let request = read_request(path)?;
        handle.submit(request)?;
        info!("Queued configuration request from {}", path.display());
    }

    tokio::select! {
        result = &mut task => {
            match result {
                Ok(Ok(())) => info!("Radio task finished"),
                Ok(Err(e)) => {
                    error!("Radio task failed: {}", e);
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down");
            task.abort();
        }
    }

    let state = handle.snapshot();
    info!("Final radio status {}: {}", state.status, handle.snapshot_json()?);
    Ok(())
}
