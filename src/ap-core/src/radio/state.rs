// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::radio::HardwareProfile;
use crate::station::{AllianceVlans, Station};

/// Value stored in a telemetry field when its reading could not be taken.
pub const MONITORING_ERROR_CODE: i32 = -999;

/// Configuration stage of the radio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RadioStatus {
    #[default]
    Booting,
    Configuring,
    Active,
    Error,
}

impl fmt::Display for RadioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Booting => "BOOTING",
            Self::Configuring => "CONFIGURING",
            Self::Active => "ACTIVE",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Channel bandwidth mode of the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelBandwidth {
    #[serde(rename = "20MHz")]
    Mhz20,
    #[serde(rename = "40MHz")]
    Mhz40,
    /// The device reports a mode this software does not manage.
    #[serde(rename = "INVALID")]
    Invalid,
}

impl ChannelBandwidth {
    /// `htmode` value in the wireless configuration.
    pub fn htmode(&self) -> Option<&'static str> {
        match self {
            Self::Mhz20 => Some("HT20"),
            Self::Mhz40 => Some("HT40"),
            Self::Invalid => None,
        }
    }

    pub fn from_htmode(htmode: &str) -> Self {
        match htmode {
            "HT20" => Self::Mhz20,
            "HT40" => Self::Mhz40,
            _ => Self::Invalid,
        }
    }
}

impl FromStr for ChannelBandwidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "20MHz" => Ok(Self::Mhz20),
            "40MHz" => Ok(Self::Mhz40),
            other => Err(format!("invalid channel bandwidth: {}", other)),
        }
    }
}

/// Observed network and link state of one team station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationStatus {
    pub ssid: String,
    pub hashed_wpa_key: String,
    pub wpa_key_salt: String,
    pub is_linked: bool,
    pub mac_address: String,
    pub bandwidth_used_mbps: f64,
    pub rx_rate_mbps: f64,
    pub tx_rate_mbps: f64,
    pub signal_noise_ratio: i32,
}

impl StationStatus {
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            ..Default::default()
        }
    }
}

/// Map of every station to its status; `None` means no team is assigned.
pub type StationStatuses = BTreeMap<Station, Option<StationStatus>>;

/// Snapshot of the access point held by the radio task and published to
/// readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioState {
    /// 5GHz or 6GHz channel number the radio is broadcasting on.
    pub channel: u32,
    pub channel_bandwidth: ChannelBandwidth,
    pub red_vlans: AllianceVlans,
    pub blue_vlans: AllianceVlans,
    pub status: RadioStatus,
    pub station_statuses: StationStatuses,
    /// Syslog target receiving logs via UDP on port 514.
    pub syslog_ip_address: String,
    pub version: String,
    #[serde(skip)]
    pub profile: HardwareProfile,
}

impl RadioState {
    /// Booting state with every station unassigned.
    pub fn new(profile: HardwareProfile, version: impl Into<String>) -> Self {
        Self {
            channel: 0,
            channel_bandwidth: ChannelBandwidth::Invalid,
            red_vlans: AllianceVlans::Vlans102030,
            blue_vlans: AllianceVlans::Vlans405060,
            status: RadioStatus::Booting,
            station_statuses: empty_station_statuses(),
            syslog_ip_address: String::new(),
            version: version.into(),
            profile,
        }
    }

    pub fn station(&self, station: Station) -> Option<&StationStatus> {
        self.station_statuses.get(&station).and_then(Option::as_ref)
    }

    /// Stations that currently have a team assigned.
    pub fn assigned_stations(&self) -> impl Iterator<Item = (Station, &StationStatus)> {
        self.station_statuses
            .iter()
            .filter_map(|(station, status)| status.as_ref().map(|s| (*station, s)))
    }
}

/// Status map with an unassigned entry for every station.
pub fn empty_station_statuses() -> StationStatuses {
    Station::ALL.into_iter().map(|s| (s, None)).collect()
}
