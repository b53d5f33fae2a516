// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The access point as seen by the radio task: configuration store,
//! command surface and hardware profile bundled together.

use std::sync::Arc;

use tracing::{debug, info};

use ap_core::radio::credentials::{hash_key, SaltSource};
use ap_core::radio::telemetry::parse_ssid;
use ap_core::radio::{command_label, CommandRunner, ConfigStore};
use ap_core::station::PLACEHOLDER_SSID_PREFIX;
use ap_core::{
    AllianceVlans, ChannelBandwidth, HardwareProfile, RadioError, RadioResult, RadioState, Station,
    StationStatus,
};

const WIRELESS: &str = "wireless";
const SYSTEM: &str = "system";
const SYSTEM_INSTANCE: &str = "@system[0]";

/// Interface-level operations on one access point.
pub struct RadioDevice {
    profile: HardwareProfile,
    store: Box<dyn ConfigStore>,
    shell: Arc<dyn CommandRunner>,
    salts: Box<dyn SaltSource>,
}

impl RadioDevice {
    /// Identify the hardware from the system model. A device that reports
    /// no model cannot be driven.
    pub async fn detect(
        mut store: Box<dyn ConfigStore>,
        shell: Arc<dyn CommandRunner>,
        salts: Box<dyn SaltSource>,
    ) -> RadioResult<Self> {
        let model = store
            .get(SYSTEM, SYSTEM_INSTANCE, "model")
            .await?
            .filter(|model| !model.trim().is_empty())
            .ok_or_else(|| RadioError::unknown_hardware("no system model reported"))?;
        let profile = HardwareProfile::from_model(&model);
        info!("Detected {} access point (model '{}')", profile, model);

        Ok(Self {
            profile,
            store,
            shell,
            salts,
        })
    }

    pub fn profile(&self) -> HardwareProfile {
        self.profile
    }

    pub fn store(&mut self) -> &mut dyn ConfigStore {
        self.store.as_mut()
    }

    async fn iwinfo(&self, station: Station, query: &str) -> RadioResult<String> {
        let iface = self.profile.interface_for(station);
        self.shell.run("iwinfo", &[iface, query]).await
    }

    /// The radio is up once the last interface answers queries.
    pub async fn is_started(&self) -> bool {
        match self.iwinfo(Station::Blue3, "info").await {
            Ok(_) => true,
            Err(e) => {
                debug!("Radio not ready: {}", e);
                false
            }
        }
    }

    /// SSID the station's interface is broadcasting.
    pub async fn read_ssid(&self, station: Station) -> RadioResult<String> {
        let output = self.iwinfo(station, "info").await?;
        parse_ssid(&output).ok_or_else(|| {
            let iface = self.profile.interface_for(station);
            RadioError::parse(command_label("iwinfo", &[iface, "info"]), output.trim())
        })
    }

    /// Observed status of a station: `None` while it broadcasts its
    /// placeholder network.
    pub async fn station_status(&mut self, station: Station) -> RadioResult<Option<StationStatus>> {
        let ssid = self.read_ssid(station).await?;
        if ssid.starts_with(PLACEHOLDER_SSID_PREFIX) {
            return Ok(None);
        }

        let mut status = StationStatus::new(ssid);
        let key = self
            .store
            .get(WIRELESS, &station.wifi_iface_section(), "key")
            .await?;
        if let Some(key) = key {
            let hashed = hash_key(&key, self.salts.as_ref());
            status.hashed_wpa_key = hashed.hashed_key;
            status.wpa_key_salt = hashed.salt;
        }
        Ok(Some(status))
    }

    pub async fn bandwidth_report(&self, station: Station) -> RadioResult<String> {
        let iface = self.profile.interface_for(station);
        self.shell.run("luci-bwc", &["-i", iface]).await
    }

    pub async fn assoc_report(&self, station: Station) -> RadioResult<String> {
        self.iwinfo(station, "assoclist").await
    }

    pub async fn reload_wifi(&self) -> RadioResult<()> {
        self.shell
            .run("wifi", &["reload", self.profile.device()])
            .await
            .map(|_| ())
    }

    pub async fn restart_syslog(&self) -> RadioResult<()> {
        self.shell
            .run("/etc/init.d/log", &["restart"])
            .await
            .map(|_| ())
    }

    /// Stage the channel of the Wi-Fi device.
    pub fn set_channel(&mut self, channel: u32) {
        let device = self.profile.device();
        self.store.set(WIRELESS, device, "channel", &channel.to_string());
    }

    /// Stage the HT mode of the Wi-Fi device.
    pub fn set_htmode(&mut self, htmode: &str) {
        let device = self.profile.device();
        self.store.set(WIRELESS, device, "htmode", htmode);
    }

    /// Stage the remote syslog destination.
    pub fn set_syslog_ip(&mut self, address: &str) {
        self.store.set(SYSTEM, SYSTEM_INSTANCE, "log_ip", address);
    }

    /// Stage one option of a station's `wifi-iface` section.
    pub fn set_station_option(&mut self, station: Station, key: &str, value: &str) {
        self.store
            .set(WIRELESS, &station.wifi_iface_section(), key, value);
    }

    /// Copy channel, bandwidth and syslog destination from the store into
    /// `state`.
    pub async fn read_settings(&mut self, state: &mut RadioState) -> RadioResult<()> {
        let device = self.profile.device();

        let channel = self.store.get(WIRELESS, device, "channel").await?;
        // `auto` and unset both mean no fixed channel.
        state.channel = channel.and_then(|c| c.parse().ok()).unwrap_or(0);

        let htmode = self.store.get(WIRELESS, device, "htmode").await?;
        state.channel_bandwidth = ChannelBandwidth::from_htmode(htmode.as_deref().unwrap_or(""));

        state.syslog_ip_address = self
            .store
            .get(SYSTEM, SYSTEM_INSTANCE, "log_ip")
            .await?
            .unwrap_or_default();
        Ok(())
    }

    /// Recover the VLAN groups from the networks of red1 and blue1. Only
    /// meaningful at boot; a group is left as is when its first station
    /// has no team network.
    pub async fn read_vlan_groups(&mut self, state: &mut RadioState) -> RadioResult<()> {
        if let Some(vlans) = self.first_network(Station::Red1).await? {
            state.red_vlans = vlans;
        }
        if let Some(vlans) = self.first_network(Station::Blue1).await? {
            state.blue_vlans = vlans;
        }
        Ok(())
    }

    async fn first_network(&mut self, station: Station) -> RadioResult<Option<AllianceVlans>> {
        let network = self
            .store
            .get(WIRELESS, &station.wifi_iface_section(), "network")
            .await?;
        Ok(network.as_deref().and_then(AllianceVlans::from_first_network))
    }
}
