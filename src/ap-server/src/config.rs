// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for ap-server.
//!
//! Config is loaded from the `[ap-server]` section of `ap-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./ap-rs.toml`
//! 3. `~/.config/ap-rs/ap-rs.toml`
//! 4. `/etc/ap-rs/ap-rs.toml`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use ap_app::ConfigFile;
use ap_backend::BackendOptions;
use ap_core::radio::controller::{FixedDelay, FixedPolling};

use crate::reconcile::ReconcileTiming;

const KNOWN_BACKENDS: [&str; 2] = ["openwrt", "dummy"];

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub general: GeneralConfig,
    pub device: DeviceConfig,
    pub behavior: BehaviorConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
    /// File holding the software version reported in the radio status
    pub version_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            version_file: "/etc/ap_version".to_string(),
        }
    }
}

/// Access point backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Backend driving the access point ("openwrt" or "dummy")
    pub backend: String,
    /// Model string the dummy backend reports
    pub dummy_model: String,
    /// Upper bound for a single device command in milliseconds
    pub command_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: "openwrt".to_string(),
            dummy_model: BackendOptions::default().dummy_model,
            command_timeout_ms: 30_000,
        }
    }
}

/// Timing of the radio task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Interval between readiness checks while the radio boots
    pub boot_poll_interval_ms: u64,
    /// Interval between station telemetry polls
    pub status_poll_interval_ms: u64,
    /// Attempts at getting the device to adopt a station configuration
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Wait after an asynchronous reload in milliseconds
    pub reload_settle_ms: u64,
    /// Number of configuration requests that may wait in the queue
    pub request_queue_size: usize,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            boot_poll_interval_ms: 3_000,
            status_poll_interval_ms: 5_000,
            max_attempts: 3,
            retry_delay_ms: 3_000,
            reload_settle_ms: 5_000,
            request_queue_size: 10,
        }
    }
}

impl BehaviorConfig {
    pub fn boot_polling(&self) -> FixedPolling {
        FixedPolling::new(Duration::from_millis(self.boot_poll_interval_ms))
    }

    pub fn status_polling(&self) -> FixedPolling {
        FixedPolling::new(Duration::from_millis(self.status_poll_interval_ms))
    }

    pub fn reconcile_timing(&self) -> ReconcileTiming {
        ReconcileTiming {
            retry: FixedDelay::new(
                self.max_attempts,
                Duration::from_millis(self.retry_delay_ms),
            ),
            reload_settle: Duration::from_millis(self.reload_settle_ms),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if !KNOWN_BACKENDS.contains(&self.device.backend.as_str()) {
            return Err(format!(
                "[device].backend '{}' is invalid (expected one of: {})",
                self.device.backend,
                KNOWN_BACKENDS.join(", ")
            ));
        }
        if self.device.command_timeout_ms == 0 {
            return Err("[device].command_timeout_ms must be > 0".to_string());
        }

        if self.behavior.boot_poll_interval_ms == 0 {
            return Err("[behavior].boot_poll_interval_ms must be > 0".to_string());
        }
        if self.behavior.status_poll_interval_ms == 0 {
            return Err("[behavior].status_poll_interval_ms must be > 0".to_string());
        }
        if self.behavior.max_attempts == 0 {
            return Err("[behavior].max_attempts must be > 0".to_string());
        }
        if self.behavior.request_queue_size == 0 {
            return Err("[behavior].request_queue_size must be > 0".to_string());
        }
        Ok(())
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            command_timeout: Duration::from_millis(self.device.command_timeout_ms),
            dummy_model: self.device.dummy_model.clone(),
        }
    }

    /// Example `ap-rs.toml` with every option at its default.
    pub fn example_combined_toml() -> String {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(rename = "ap-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
                ..GeneralConfig::default()
            },
            ..ServerConfig::default()
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "ap-server"
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.general.version_file, "/etc/ap_version");
        assert_eq!(config.device.backend, "openwrt");
        assert_eq!(config.device.command_timeout_ms, 30_000);
        assert_eq!(config.behavior.boot_poll_interval_ms, 3_000);
        assert_eq!(config.behavior.status_poll_interval_ms, 5_000);
        assert_eq!(config.behavior.max_attempts, 3);
        assert_eq!(config.behavior.request_queue_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[ap-server.general]
log_level = "debug"

[ap-server.device]
backend = "dummy"
dummy_model = "VH-109"

[ap-server.behavior]
retry_delay_ms = 0
"#,
        )
        .unwrap();

        let config = ServerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("debug"));
        assert_eq!(config.device.backend, "dummy");
        assert_eq!(config.backend_options().dummy_model, "VH-109");
        assert_eq!(config.behavior.max_attempts, 3);

        let timing = config.behavior.reconcile_timing();
        assert_eq!(timing.retry, FixedDelay::new(3, Duration::ZERO));
        assert_eq!(timing.reload_settle, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.general.log_level = Some("loud".to_string());
        assert!(config.validate().unwrap_err().contains("log_level"));

        let mut config = ServerConfig::default();
        config.device.backend = "mikrotik".to_string();
        assert!(config.validate().unwrap_err().contains("backend"));

        let mut config = ServerConfig::default();
        config.behavior.status_poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.behavior.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.behavior.request_queue_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_round_trips() {
        let example = ServerConfig::example_combined_toml();
        assert!(example.contains("[ap-server.general]"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(example.as_bytes()).unwrap();
        let config = ServerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("info"));
        assert!(config.validate().is_ok());
    }
}
