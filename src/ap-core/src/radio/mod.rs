// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::station::Station;
use crate::RadioResult;

pub mod controller;
pub mod credentials;
pub mod request;
pub mod response;
pub mod state;
pub mod telemetry;

/// Alias to reduce type complexity in the device traits.
pub type RadioFuture<'a, T> = Pin<Box<dyn Future<Output = RadioResult<T>> + Send + 'a>>;

/// Substring of the system model identifying Vivid-Hosting hardware.
const VIVID_HOSTING_MODEL_MARKER: &str = "VH";

/// Device family of the access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareProfile {
    Linksys,
    VividHosting,
}

impl HardwareProfile {
    /// Select the profile from the system model string.
    pub fn from_model(model: &str) -> Self {
        if model.contains(VIVID_HOSTING_MODEL_MARKER) {
            Self::VividHosting
        } else {
            Self::Linksys
        }
    }

    /// Name of the Wi-Fi device carrying channel and bandwidth settings.
    pub fn device(&self) -> &'static str {
        match self {
            Self::Linksys => "radio0",
            Self::VividHosting => "wifi1",
        }
    }

    /// Wireless interface serving the given station.
    pub fn interface_for(&self, station: Station) -> &'static str {
        match (self, station) {
            (Self::Linksys, Station::Red1) => "wlan0",
            (Self::Linksys, Station::Red2) => "wlan0-1",
            (Self::Linksys, Station::Red3) => "wlan0-2",
            (Self::Linksys, Station::Blue1) => "wlan0-3",
            (Self::Linksys, Station::Blue2) => "wlan0-4",
            (Self::Linksys, Station::Blue3) => "wlan0-5",
            (Self::VividHosting, Station::Red1) => "ath1",
            (Self::VividHosting, Station::Red2) => "ath11",
            (Self::VividHosting, Station::Red3) => "ath12",
            (Self::VividHosting, Station::Blue1) => "ath13",
            (Self::VividHosting, Station::Blue2) => "ath14",
            (Self::VividHosting, Station::Blue3) => "ath15",
        }
    }

    /// `wifi reload` returns before the new configuration is live.
    pub fn reload_is_async(&self) -> bool {
        matches!(self, Self::Linksys)
    }

    /// Reconfiguring populated stations can crash the radio, so every
    /// configuration is preceded by a full unassign pass.
    pub fn requires_clear_before_configure(&self) -> bool {
        matches!(self, Self::Linksys)
    }

    /// WPA3 key is stored separately as `sae_password`.
    pub fn has_sae_password(&self) -> bool {
        matches!(self, Self::VividHosting)
    }
}

impl fmt::Display for HardwareProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linksys => write!(f, "Linksys"),
            Self::VividHosting => write!(f, "Vivid-Hosting"),
        }
    }
}

/// Persistent key/value configuration tree with staged writes.
///
/// Sections are configuration files (`wireless`, `system`), instances are
/// named or anonymous sections within them (`radio0`, `@wifi-iface[1]`).
/// Writes are staged until `commit`, which applies all of them at once.
pub trait ConfigStore: Send + Sync {
    /// Read a value, seeing staged writes. `Ok(None)` when the key is absent.
    fn get<'a>(
        &'a mut self,
        section: &'a str,
        instance: &'a str,
        key: &'a str,
    ) -> RadioFuture<'a, Option<String>>;

    /// Stage a value for the next commit.
    fn set(&mut self, section: &str, instance: &str, key: &str, value: &str);

    /// Persist every staged write.
    fn commit<'a>(&'a mut self) -> RadioFuture<'a, ()>;
}

/// Synchronous invocation of device commands capturing their stdout.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> RadioFuture<'a, String>;
}

/// Command line as shown in logs and errors.
pub fn command_label(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
