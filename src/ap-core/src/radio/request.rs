// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::radio::state::ChannelBandwidth;
use crate::station::{AllianceVlans, Station, PLACEHOLDER_SSID_PREFIX};
use crate::{RadioError, RadioResult};

const MAX_SSID_LEN: usize = 32;
const MIN_WPA_KEY_LEN: usize = 8;
const MAX_WPA_KEY_LEN: usize = 63;

/// Desired configuration submitted to the radio task.
///
/// Zero/empty/absent fields leave the corresponding setting unchanged,
/// except for stations: any station missing from `station_configurations`
/// (or mapped to `null`) is unassigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigurationRequest {
    /// 5GHz or 6GHz channel number; 0 keeps the current channel.
    pub channel: u32,
    /// `"20MHz"` or `"40MHz"`.
    pub channel_bandwidth: Option<String>,
    /// Only applied when `blue_vlans` is given as well.
    pub red_vlans: Option<AllianceVlans>,
    /// Only applied when `red_vlans` is given as well.
    pub blue_vlans: Option<AllianceVlans>,
    /// Syslog target (UDP port 514); empty keeps the current target.
    pub syslog_ip_address: String,
    /// Station display name to team network, `null` to unassign.
    pub station_configurations: BTreeMap<String, Option<StationConfiguration>>,
}

/// Team network parameters for one station.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfiguration {
    pub ssid: String,
    pub wpa_key: String,
}

impl StationConfiguration {
    pub fn new(ssid: impl Into<String>, wpa_key: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            wpa_key: wpa_key.into(),
        }
    }

    fn validate(&self, station: Station) -> RadioResult<()> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_LEN {
            return Err(RadioError::invalid_request(format!(
                "{}: SSID must be 1-{} characters",
                station, MAX_SSID_LEN
            )));
        }
        if self.ssid.starts_with(PLACEHOLDER_SSID_PREFIX) {
            return Err(RadioError::invalid_request(format!(
                "{}: SSID may not start with '{}'",
                station, PLACEHOLDER_SSID_PREFIX
            )));
        }
        // The device reports SSIDs back through a pattern that only accepts
        // word characters, dashes and spaces.
        if !self
            .ssid
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
        {
            return Err(RadioError::invalid_request(format!(
                "{}: SSID '{}' contains unsupported characters",
                station, self.ssid
            )));
        }
        let key_len = self.wpa_key.chars().count();
        if !(MIN_WPA_KEY_LEN..=MAX_WPA_KEY_LEN).contains(&key_len) {
            return Err(RadioError::invalid_request(format!(
                "{}: WPA key must be {}-{} characters",
                station, MIN_WPA_KEY_LEN, MAX_WPA_KEY_LEN
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for StationConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationConfiguration")
            .field("ssid", &self.ssid)
            .field("wpa_key", &"<redacted>")
            .finish()
    }
}

impl ConfigurationRequest {
    /// Check every field without touching any state.
    pub fn validate(&self) -> RadioResult<()> {
        self.bandwidth()?;
        self.station_configs()?;
        Ok(())
    }

    /// Requested bandwidth mode, `None` when unspecified.
    pub fn bandwidth(&self) -> RadioResult<Option<ChannelBandwidth>> {
        match self.channel_bandwidth.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<ChannelBandwidth>()
                .map(Some)
                .map_err(RadioError::invalid_request),
        }
    }

    /// Requested VLAN groups, only when both alliances are given.
    pub fn vlans(&self) -> Option<(AllianceVlans, AllianceVlans)> {
        match (self.red_vlans, self.blue_vlans) {
            (Some(red), Some(blue)) => Some((red, blue)),
            _ => None,
        }
    }

    /// Stations with a team assigned, keyed by catalog entry.
    pub fn station_configs(&self) -> RadioResult<BTreeMap<Station, StationConfiguration>> {
        let mut configs = BTreeMap::new();
        for (name, config) in &self.station_configurations {
            let station = name
                .parse::<Station>()
                .map_err(RadioError::invalid_request)?;
            if let Some(config) = config {
                config.validate(station)?;
                configs.insert(station, config.clone());
            }
        }
        Ok(configs)
    }

    /// Builder used when assembling requests in code.
    pub fn with_station(mut self, station: Station, config: StationConfiguration) -> Self {
        self.station_configurations
            .insert(station.to_string(), Some(config));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_request() {
        let json = r#"{
            "channel": 93,
            "channelBandwidth": "40MHz",
            "redVlans": "10_20_30",
            "blueVlans": "70_80_90",
            "stationConfigurations": {
                "red1": {"ssid": "254", "wpaKey": "12345678"},
                "blue2": null
            }
        }"#;
        let request: ConfigurationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.channel, 93);
        assert_eq!(request.bandwidth().unwrap(), Some(ChannelBandwidth::Mhz40));
        assert_eq!(
            request.vlans(),
            Some((AllianceVlans::Vlans102030, AllianceVlans::Vlans708090))
        );
        assert_eq!(request.syslog_ip_address, "");

        let configs = request.station_configs().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[&Station::Red1].ssid, "254");
    }

    #[test]
    fn test_single_alliance_vlans_ignored() {
        let request = ConfigurationRequest {
            red_vlans: Some(AllianceVlans::Vlans405060),
            ..Default::default()
        };
        assert_eq!(request.vlans(), None);
    }

    #[test]
    fn test_rejects_invalid_bandwidth() {
        let request = ConfigurationRequest {
            channel_bandwidth: Some("80MHz".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(RadioError::InvalidRequest(_))
        ));

        let empty = ConfigurationRequest {
            channel_bandwidth: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.bandwidth().unwrap(), None);
    }

    #[test]
    fn test_rejects_unknown_station() {
        let mut request = ConfigurationRequest::default();
        request.station_configurations.insert(
            "red4".to_string(),
            Some(StationConfiguration::new("1234", "abcdefgh")),
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_station_configurations() {
        let cases = [
            StationConfiguration::new("", "abcdefgh"),
            StationConfiguration::new("no-team-1", "abcdefgh"),
            StationConfiguration::new("team\"quote", "abcdefgh"),
            StationConfiguration::new("1234", "short"),
            StationConfiguration::new("x".repeat(33), "abcdefgh"),
        ];
        for config in cases {
            let request = ConfigurationRequest::default().with_station(Station::Red1, config);
            assert!(request.validate().is_err(), "{:?}", request);
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = StationConfiguration::new("1234", "supersecret");
        let printed = format!("{:?}", config);
        assert!(printed.contains("1234"));
        assert!(!printed.contains("supersecret"));
    }
}
