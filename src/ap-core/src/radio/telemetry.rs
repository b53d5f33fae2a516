// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Parsers for the text reports of the device introspection commands.
//!
//! - `iwinfo <iface> info` carries the broadcast SSID.
//! - `luci-bwc -i <iface>` lists one traffic sample per second as
//!   `[ timestamp, rx bytes, rx packets, tx bytes, tx packets ]`.
//! - `iwinfo <iface> assoclist` has one block per associated client with
//!   signal/noise and the negotiated RX/TX rates.

use std::sync::OnceLock;

use regex::Regex;

use crate::radio::state::{StationStatus, MONITORING_ERROR_CODE};

/// Number of trailing bandwidth samples averaged for the current figure.
const BANDWIDTH_WINDOW: usize = 6;

const NULL_MAC_ADDRESS: &str = "00:00:00:00:00:00";

fn ssid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"ESSID: "([-\w ]*)""#).expect("valid ESSID regex"))
}

fn bandwidth_sample_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\s*(\d+),\s*(\d+),\s*(\d+),\s*(\d+),\s*(\d+)\s*\]")
            .expect("valid luci-bwc regex")
    })
}

fn assoc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?s)([0-9A-Fa-f:]{17})\s+(-?\d+) dBm / (-?\d+) dBm \(SNR (-?\d+)\)\s+\d+ ms ago",
            r"\s+RX:\s+([\d.]+)\s+MBit/s.*?TX:\s+([\d.]+)\s+MBit/s",
        ))
        .expect("valid assoclist regex")
    })
}

/// SSID reported by `iwinfo <iface> info`, `None` if the report has none.
pub fn parse_ssid(output: &str) -> Option<String> {
    ssid_re()
        .captures(output)
        .map(|caps| caps[1].to_string())
}

#[derive(Debug, Clone, Copy)]
struct BandwidthSample {
    timestamp: u64,
    rx_bytes: u64,
    tx_bytes: u64,
}

/// Combined RX+TX throughput in Mbps over the newest samples of a
/// `luci-bwc` report.
///
/// Returns `None` when the report contains no samples at all. A single
/// sample has no history to compare against and yields zero.
pub fn parse_bandwidth_used(output: &str) -> Option<f64> {
    let samples: Vec<BandwidthSample> = bandwidth_sample_re()
        .captures_iter(output)
        .filter_map(|caps| {
            Some(BandwidthSample {
                timestamp: caps[1].parse().ok()?,
                rx_bytes: caps[2].parse().ok()?,
                tx_bytes: caps[4].parse().ok()?,
            })
        })
        .collect();

    let last = *samples.last()?;
    let first = samples[samples.len().saturating_sub(BANDWIDTH_WINDOW)];
    let seconds = last.timestamp.saturating_sub(first.timestamp);
    if seconds == 0 {
        return Some(0.0);
    }

    // Counters restart when the interface is brought back up.
    let bytes = last.rx_bytes.saturating_sub(first.rx_bytes)
        + last.tx_bytes.saturating_sub(first.tx_bytes);
    Some(bytes as f64 * 8.0 / 1_000_000.0 / seconds as f64)
}

/// Link quality of the first real client in an assoclist report.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkQuality {
    pub mac_address: String,
    pub signal_dbm: i32,
    pub noise_dbm: i32,
    pub signal_noise_ratio: i32,
    pub rx_rate_mbps: f64,
    pub tx_rate_mbps: f64,
}

/// Parse `iwinfo <iface> assoclist`. `None` means no client is associated,
/// which is the normal state of a station whose robot is off.
pub fn parse_assoc_list(output: &str) -> Option<LinkQuality> {
    assoc_re()
        .captures_iter(output)
        .filter(|caps| &caps[1] != NULL_MAC_ADDRESS)
        .find_map(|caps| {
            Some(LinkQuality {
                mac_address: caps[1].to_uppercase(),
                signal_dbm: caps[2].parse().ok()?,
                noise_dbm: caps[3].parse().ok()?,
                signal_noise_ratio: caps[4].parse().ok()?,
                rx_rate_mbps: caps[5].parse().ok()?,
                tx_rate_mbps: caps[6].parse().ok()?,
            })
        })
}

/// Update bandwidth from a `luci-bwc` report; `None` means the command
/// itself failed.
pub fn record_bandwidth(status: &mut StationStatus, output: Option<&str>) {
    status.bandwidth_used_mbps = output
        .and_then(parse_bandwidth_used)
        .unwrap_or(f64::from(MONITORING_ERROR_CODE));
}

/// Update link fields from an assoclist report; `None` means the command
/// itself failed.
pub fn record_link_quality(status: &mut StationStatus, output: Option<&str>) {
    let Some(output) = output else {
        status.is_linked = false;
        status.mac_address.clear();
        status.rx_rate_mbps = f64::from(MONITORING_ERROR_CODE);
        status.tx_rate_mbps = f64::from(MONITORING_ERROR_CODE);
        status.signal_noise_ratio = MONITORING_ERROR_CODE;
        return;
    };

    match parse_assoc_list(output) {
        Some(link) => {
            status.is_linked = true;
            status.mac_address = link.mac_address;
            status.rx_rate_mbps = link.rx_rate_mbps;
            status.tx_rate_mbps = link.tx_rate_mbps;
            status.signal_noise_ratio = link.signal_noise_ratio;
        }
        None => {
            status.is_linked = false;
            status.mac_address.clear();
            status.rx_rate_mbps = 0.0;
            status.tx_rate_mbps = 0.0;
            status.signal_noise_ratio = 0;
        }
    }
}
