// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Team station catalog and VLAN assignment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// VLAN number reported when a station/group combination has no valid VLAN.
pub const INVALID_VLAN: i32 = -1;

/// Prefix of the SSID given to stations without an assigned team.
pub const PLACEHOLDER_SSID_PREFIX: &str = "no-team-";

/// One of the six team network slots on the access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Station {
    Red1,
    Red2,
    Red3,
    Blue1,
    Blue2,
    Blue3,
}

/// Group of three stations sharing a VLAN group selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Red,
    Blue,
}

impl Station {
    /// All stations in iteration order.
    pub const ALL: [Station; 6] = [
        Station::Red1,
        Station::Red2,
        Station::Red3,
        Station::Blue1,
        Station::Blue2,
        Station::Blue3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red1 => "red1",
            Self::Red2 => "red2",
            Self::Red3 => "red3",
            Self::Blue1 => "blue1",
            Self::Blue2 => "blue2",
            Self::Blue3 => "blue3",
        }
    }

    /// Zero-based index in catalog order.
    pub fn index(&self) -> usize {
        match self {
            Self::Red1 => 0,
            Self::Red2 => 1,
            Self::Red3 => 2,
            Self::Blue1 => 3,
            Self::Blue2 => 4,
            Self::Blue3 => 5,
        }
    }

    pub fn alliance(&self) -> Alliance {
        match self {
            Self::Red1 | Self::Red2 | Self::Red3 => Alliance::Red,
            Self::Blue1 | Self::Blue2 | Self::Blue3 => Alliance::Blue,
        }
    }

    /// Position within the alliance, 1 through 3.
    pub fn position(&self) -> usize {
        self.index() % 3 + 1
    }

    /// Anonymous section name of the station's wifi-iface in the wireless
    /// configuration. Section 0 belongs to the admin network, so stations
    /// start at 1.
    pub fn wifi_iface_section(&self) -> String {
        format!("@wifi-iface[{}]", self.index() + 1)
    }

    /// SSID staged on the station when no team is assigned.
    pub fn placeholder_ssid(&self) -> String {
        format!("{}{}", PLACEHOLDER_SSID_PREFIX, self.index() + 1)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Station {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Station::ALL
            .into_iter()
            .find(|station| station.as_str() == s)
            .ok_or_else(|| format!("unknown station '{}'", s))
    }
}

/// The three VLAN triples an alliance can be put on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllianceVlans {
    #[serde(rename = "10_20_30")]
    Vlans102030,
    #[serde(rename = "40_50_60")]
    Vlans405060,
    #[serde(rename = "70_80_90")]
    Vlans708090,
}

impl AllianceVlans {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vlans102030 => "10_20_30",
            Self::Vlans405060 => "40_50_60",
            Self::Vlans708090 => "70_80_90",
        }
    }

    fn offset(&self) -> i32 {
        match self {
            Self::Vlans102030 => 0,
            Self::Vlans405060 => 3,
            Self::Vlans708090 => 6,
        }
    }

    /// VLAN number for the given 1-based position within the alliance.
    /// Returns [`INVALID_VLAN`] for positions outside 1..=3.
    pub fn vlan_for_position(&self, position: usize) -> i32 {
        if !(1..=3).contains(&position) {
            return INVALID_VLAN;
        }
        10 * (position as i32 + self.offset())
    }

    /// Recover the group from a network name such as `vlan40` used by the
    /// first station of an alliance.
    pub fn from_first_network(network: &str) -> Option<Self> {
        match network {
            "vlan10" => Some(Self::Vlans102030),
            "vlan40" => Some(Self::Vlans405060),
            "vlan70" => Some(Self::Vlans708090),
            _ => None,
        }
    }
}

impl fmt::Display for AllianceVlans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllianceVlans {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "10_20_30" => Ok(Self::Vlans102030),
            "40_50_60" => Ok(Self::Vlans405060),
            "70_80_90" => Ok(Self::Vlans708090),
            other => Err(format!("unknown VLAN group '{}'", other)),
        }
    }
}

/// VLAN number of a station given the groups chosen for each alliance.
pub fn station_vlan(station: Station, red: Option<AllianceVlans>, blue: Option<AllianceVlans>) -> i32 {
    let vlans = match station.alliance() {
        Alliance::Red => red,
        Alliance::Blue => blue,
    };
    vlans
        .map(|v| v.vlan_for_position(station.position()))
        .unwrap_or(INVALID_VLAN)
}
