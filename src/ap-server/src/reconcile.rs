// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Applying configuration requests to the access point and reading back
//! what it actually does.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info, warn};

use ap_core::radio::controller::{FixedDelay, RetryPolicy};
use ap_core::radio::state::{empty_station_statuses, StationStatuses};
use ap_core::radio::telemetry::{record_bandwidth, record_link_quality};
use ap_core::station::{station_vlan, INVALID_VLAN};
use ap_core::{
    AllianceVlans, ConfigurationRequest, RadioError, RadioResult, RadioState, Station,
    StationConfiguration,
};

use crate::device::RadioDevice;

/// Delays and retry budget of a reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileTiming {
    pub retry: FixedDelay,
    /// Wait after an asynchronous `wifi reload` before reading back.
    pub reload_settle: Duration,
}

/// Apply a full configuration request.
///
/// A syslog change is committed on its own and the logging service
/// restarted before anything else is staged. Channel and bandwidth go out
/// with the first station commit.
pub async fn configure(
    device: &mut RadioDevice,
    state: &mut RadioState,
    request: &ConfigurationRequest,
    timing: &ReconcileTiming,
) -> RadioResult<()> {
    request.validate()?;
    let bandwidth = request.bandwidth()?;
    let stations = request.station_configs()?;

    if !request.syslog_ip_address.is_empty() {
        info!("Setting syslog destination to {}", request.syslog_ip_address);
        device.set_syslog_ip(&request.syslog_ip_address);
        device.store().commit().await?;
        device.restart_syslog().await?;
    }

    if request.channel > 0 {
        device.set_channel(request.channel);
    }
    if let Some(htmode) = bandwidth.and_then(|b| b.htmode()) {
        device.set_htmode(htmode);
    }
    // Unassigned stations carry no `network`, so the groups cannot be
    // recovered from the store later on.
    let (red, blue) = request
        .vlans()
        .unwrap_or((state.red_vlans, state.blue_vlans));
    state.red_vlans = red;
    state.blue_vlans = blue;

    if device.profile().requires_clear_before_configure() {
        info!("Clearing all stations before applying new configuration");
        configure_stations(device, state, &BTreeMap::new(), (red, blue), timing).await?;
        time::sleep(timing.reload_settle).await;
    }

    configure_stations(device, state, &stations, (red, blue), timing).await
}

/// Put exactly the given stations on the air and wait for the device to
/// report them. Every other station gets its placeholder network.
///
/// Commit and reload failures end the reconciliation at once. A device
/// that reports something other than what was committed is given another
/// attempt while the retry policy allows it.
pub async fn configure_stations(
    device: &mut RadioDevice,
    state: &mut RadioState,
    desired: &BTreeMap<Station, StationConfiguration>,
    vlans: (AllianceVlans, AllianceVlans),
    timing: &ReconcileTiming,
) -> RadioResult<()> {
    let retry = &timing.retry;
    let mut attempt = 1;
    loop {
        stage_stations(device, desired, vlans)?;
        device.store().commit().await?;
        device.reload_wifi().await?;
        if device.profile().reload_is_async() {
            time::sleep(timing.reload_settle).await;
        }

        update_station_statuses(device, state).await?;
        if is_converged(&state.station_statuses, desired) {
            info!("Stations configured after {} attempt(s)", attempt);
            return Ok(());
        }

        let err = RadioError::not_converged(attempt);
        if !retry.should_retry(attempt, &err) {
            return Err(err);
        }
        warn!(
            "Station configuration not yet applied (attempt {}/{}); retrying in {:?}",
            attempt,
            retry.max_attempts(),
            retry.delay(attempt)
        );
        time::sleep(retry.delay(attempt)).await;
        attempt += 1;
    }
}

fn stage_stations(
    device: &mut RadioDevice,
    desired: &BTreeMap<Station, StationConfiguration>,
    (red, blue): (AllianceVlans, AllianceVlans),
) -> RadioResult<()> {
    let sae_password = device.profile().has_sae_password();
    for station in Station::ALL {
        match desired.get(&station) {
            Some(config) => {
                let vlan = station_vlan(station, Some(red), Some(blue));
                if vlan == INVALID_VLAN {
                    return Err(RadioError::invalid_request(format!(
                        "no VLAN for station {}",
                        station
                    )));
                }
                device.set_station_option(station, "ssid", &config.ssid);
                device.set_station_option(station, "key", &config.wpa_key);
                if sae_password {
                    device.set_station_option(station, "sae_password", &config.wpa_key);
                }
                device.set_station_option(station, "network", &format!("vlan{}", vlan));
            }
            None => {
                let placeholder = station.placeholder_ssid();
                device.set_station_option(station, "ssid", &placeholder);
                device.set_station_option(station, "key", &placeholder);
                if sae_password {
                    device.set_station_option(station, "sae_password", &placeholder);
                }
            }
        }
    }
    Ok(())
}

/// Every requested station broadcasts its SSID and nothing else is on air.
fn is_converged(
    observed: &StationStatuses,
    desired: &BTreeMap<Station, StationConfiguration>,
) -> bool {
    Station::ALL.iter().all(|station| {
        let actual = observed.get(station).and_then(Option::as_ref);
        match (desired.get(station), actual) {
            (Some(config), Some(status)) => status.ssid == config.ssid,
            (None, None) => true,
            _ => false,
        }
    })
}

/// Re-read every station from the device. The map in `state` is replaced
/// only if all six reads succeed.
pub async fn update_station_statuses(
    device: &mut RadioDevice,
    state: &mut RadioState,
) -> RadioResult<()> {
    let mut statuses = empty_station_statuses();
    for station in Station::ALL {
        let status = device.station_status(station).await?;
        debug!(
            "Station {} reports {}",
            station,
            status.as_ref().map(|s| s.ssid.as_str()).unwrap_or("no team")
        );
        statuses.insert(station, status);
    }
    state.station_statuses = statuses;
    Ok(())
}

/// Refresh bandwidth and link figures of every assigned station. Each
/// metric group that cannot be read is set to the monitoring sentinel.
pub async fn update_station_monitoring(device: &RadioDevice, state: &mut RadioState) {
    for (station, status) in state.station_statuses.iter_mut() {
        let Some(status) = status.as_mut() else {
            continue;
        };

        let bandwidth = match device.bandwidth_report(*station).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Bandwidth of {} unavailable: {}", station, e);
                None
            }
        };
        record_bandwidth(status, bandwidth.as_deref());

        let link = match device.assoc_report(*station).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Link quality of {} unavailable: {}", station, e);
                None
            }
        };
        record_link_quality(status, link.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ap_backend::DummyAccessPoint;
    use ap_core::radio::credentials::FixedSalt;
    use ap_core::radio::state::MONITORING_ERROR_CODE;
    use ap_core::ChannelBandwidth;

    fn fast_timing() -> ReconcileTiming {
        ReconcileTiming {
            retry: FixedDelay::new(3, Duration::ZERO),
            reload_settle: Duration::ZERO,
        }
    }

    async fn setup(model: &str) -> (DummyAccessPoint, RadioDevice, RadioState) {
        let ap = DummyAccessPoint::new(model);
        let device = RadioDevice::detect(
            Box::new(ap.clone()),
            Arc::new(ap.clone()),
            Box::new(FixedSalt("saltsaltsaltsalt".to_string())),
        )
        .await
        .unwrap();
        let state = RadioState::new(device.profile(), "test");
        (ap, device, state)
    }

    fn two_teams() -> ConfigurationRequest {
        ConfigurationRequest::default()
            .with_station(Station::Red1, StationConfiguration::new("254", "cheesypoofs"))
            .with_station(Station::Blue3, StationConfiguration::new("1678", "citrusdimes"))
    }

    #[tokio::test]
    async fn configures_only_named_stations() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();

        assert_eq!(state.station(Station::Red1).unwrap().ssid, "254");
        assert_eq!(state.station(Station::Blue3).unwrap().ssid, "1678");
        assert_eq!(state.assigned_stations().count(), 2);
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[6]", "network").as_deref(),
            Some("vlan60")
        );
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[1]", "sae_password").as_deref(),
            Some("cheesypoofs")
        );
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[2]", "key").as_deref(),
            Some("no-team-2")
        );
        assert_eq!(ap.reload_count(), 1);
    }

    #[tokio::test]
    async fn applies_device_settings_and_vlan_groups() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        let mut request = two_teams();
        request.channel = 93;
        request.channel_bandwidth = Some("40MHz".to_string());
        request.red_vlans = Some(AllianceVlans::Vlans708090);
        request.blue_vlans = Some(AllianceVlans::Vlans102030);

        configure(&mut device, &mut state, &request, &fast_timing())
            .await
            .unwrap();

        assert_eq!(ap.committed("wireless", "wifi1", "channel").as_deref(), Some("93"));
        assert_eq!(ap.committed("wireless", "wifi1", "htmode").as_deref(), Some("HT40"));
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[1]", "network").as_deref(),
            Some("vlan70")
        );
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[6]", "network").as_deref(),
            Some("vlan30")
        );

        device.read_settings(&mut state).await.unwrap();
        assert_eq!(state.channel, 93);
        assert_eq!(state.channel_bandwidth, ChannelBandwidth::Mhz40);
        assert_eq!(state.red_vlans, AllianceVlans::Vlans708090);
    }

    #[tokio::test]
    async fn invalid_bandwidth_leaves_store_untouched() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        let mut request = two_teams();
        request.channel = 5;
        request.channel_bandwidth = Some("80MHz".to_string());

        let err = configure(&mut device, &mut state, &request, &fast_timing())
            .await
            .unwrap_err();
        assert!(matches!(err, RadioError::InvalidRequest(_)));
        assert_eq!(ap.commit_count(), 0);
        assert_eq!(ap.committed("wireless", "wifi1", "channel").as_deref(), Some("36"));
    }

    #[tokio::test]
    async fn retries_until_device_catches_up() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        ap.misreport_next_reloads(2);

        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();
        assert_eq!(ap.reload_count(), 3);
        assert_eq!(state.station(Station::Red1).unwrap().ssid, "254");
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        ap.misreport_next_reloads(u32::MAX);

        let err = configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap_err();
        assert!(matches!(err, RadioError::NotConverged { attempts: 3 }));
        assert_eq!(ap.reload_count(), 3);
    }

    #[tokio::test]
    async fn stale_station_forces_another_attempt() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        ap.set_live_ssid(Station::Red2, "971");
        ap.misreport_next_reloads(1);

        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();
        assert_eq!(ap.reload_count(), 2);
        assert_eq!(state.station(Station::Red2), None);
    }

    #[tokio::test]
    async fn commit_failure_is_not_retried() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        ap.set_fail_commits(true);

        let err = configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap_err();
        assert!(matches!(err, RadioError::Store(_)));
        assert_eq!(ap.reload_count(), 0);
    }

    #[tokio::test]
    async fn reload_failure_is_not_retried() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        ap.fail_command("wifi reload");

        let err = configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap_err();
        assert!(matches!(err, RadioError::Command { .. }));
        assert_eq!(ap.commit_count(), 1);
    }

    #[tokio::test]
    async fn linksys_clears_stations_first() {
        let (ap, mut device, mut state) = setup("Linksys E8450").await;
        ap.set_live_ssid(Station::Red1, "118");

        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();

        let history = ap.reload_history();
        assert_eq!(history.len(), 2);
        assert!(history[0].iter().all(|ssid| ssid.starts_with("no-team-")));
        assert_eq!(history[1][0], "254");
        assert_eq!(history[1][5], "1678");
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[1]", "sae_password"),
            None
        );
    }

    #[tokio::test]
    async fn syslog_change_restarts_logging() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        let mut request = ConfigurationRequest::default();
        request.syslog_ip_address = "10.0.100.40".to_string();

        configure(&mut device, &mut state, &request, &fast_timing())
            .await
            .unwrap();
        assert_eq!(
            ap.committed("system", "@system[0]", "log_ip").as_deref(),
            Some("10.0.100.40")
        );
        assert!(ap
            .command_log()
            .contains(&"/etc/init.d/log restart".to_string()));
    }

    #[tokio::test]
    async fn syslog_restart_failure_aborts() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        ap.fail_command("/etc/init.d/log");
        let mut request = two_teams();
        request.syslog_ip_address = "10.0.100.40".to_string();
        request.channel = 93;
        request.channel_bandwidth = Some("40MHz".to_string());

        assert!(configure(&mut device, &mut state, &request, &fast_timing())
            .await
            .is_err());
        assert_eq!(ap.reload_count(), 0);
        assert_eq!(ap.committed("wireless", "wifi1", "channel").as_deref(), Some("36"));
        assert_eq!(ap.committed("wireless", "wifi1", "htmode").as_deref(), Some("HT20"));
    }

    #[tokio::test]
    async fn vlan_groups_survive_unassigned_first_stations() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        let mut request = ConfigurationRequest::default()
            .with_station(Station::Blue3, StationConfiguration::new("1678", "citrusdimes"));
        request.red_vlans = Some(AllianceVlans::Vlans708090);
        request.blue_vlans = Some(AllianceVlans::Vlans102030);
        configure(&mut device, &mut state, &request, &fast_timing())
            .await
            .unwrap();
        device.read_settings(&mut state).await.unwrap();
        assert_eq!(state.red_vlans, AllianceVlans::Vlans708090);
        assert_eq!(state.blue_vlans, AllianceVlans::Vlans102030);

        let request = ConfigurationRequest::default()
            .with_station(Station::Red1, StationConfiguration::new("254", "cheesypoofs"));
        configure(&mut device, &mut state, &request, &fast_timing())
            .await
            .unwrap();
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[1]", "network").as_deref(),
            Some("vlan70")
        );
        assert_eq!(state.red_vlans, AllianceVlans::Vlans708090);
    }

    #[tokio::test]
    async fn unassigned_vivid_station_drops_team_password() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();
        configure(
            &mut device,
            &mut state,
            &ConfigurationRequest::default(),
            &fast_timing(),
        )
        .await
        .unwrap();

        assert_eq!(state.assigned_stations().count(), 0);
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[1]", "sae_password").as_deref(),
            Some("no-team-1")
        );
        assert_eq!(
            ap.committed("wireless", "@wifi-iface[6]", "sae_password").as_deref(),
            Some("no-team-6")
        );
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_map() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();
        let before = state.station_statuses.clone();

        ap.set_live_ssid(Station::Red1, "no-team-1");
        ap.fail_command("iwinfo ath15 info");
        assert!(update_station_statuses(&mut device, &mut state).await.is_err());
        assert_eq!(state.station_statuses, before);
    }

    #[tokio::test]
    async fn monitoring_failures_are_independent() {
        let (ap, mut device, mut state) = setup("VH-109").await;
        configure(&mut device, &mut state, &two_teams(), &fast_timing())
            .await
            .unwrap();
        ap.set_assoc_report(
            Station::Red1,
            "AA:BB:CC:DD:EE:FF  -52 dBm / -95 dBm (SNR 43)  0 ms ago\n\
             \tRX: 432.3 MBit/s, MCS 9, 80MHz                  1024 Pkts.\n\
             \tTX: 576.5 MBit/s, MCS 11, 80MHz                 2048 Pkts.\n",
        );
        ap.set_bandwidth_report(
            Station::Red1,
            "[ 100, 0, 0, 0, 0 ],\n[ 101, 1000000, 10, 250000, 5 ]\n",
        );
        ap.fail_command("luci-bwc -i ath15");

        update_station_monitoring(&device, &mut state).await;

        let red1 = state.station(Station::Red1).unwrap();
        assert!(red1.is_linked);
        assert_eq!(red1.mac_address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(red1.signal_noise_ratio, 43);
        assert_eq!(red1.rx_rate_mbps, 432.3);
        assert_eq!(red1.tx_rate_mbps, 576.5);
        assert_eq!(red1.bandwidth_used_mbps, 10.0);

        let blue3 = state.station(Station::Blue3).unwrap();
        assert_eq!(blue3.bandwidth_used_mbps, f64::from(MONITORING_ERROR_CODE));
        assert!(!blue3.is_linked);
        assert_eq!(blue3.rx_rate_mbps, 0.0);
        assert_eq!(blue3.signal_noise_ratio, 0);

        assert_eq!(state.station(Station::Red2), None);
        let log = ap.command_log();
        assert!(!log.contains(&"luci-bwc -i ath11".to_string()));
        assert!(!log.contains(&"iwinfo ath11 assoclist".to_string()));
    }
}
