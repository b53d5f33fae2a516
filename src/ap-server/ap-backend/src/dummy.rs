// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Dummy access point for development and testing.
//!
//! Keeps the configuration tree and the live interface state in memory and
//! answers the device commands the controller issues. Both device families
//! are simulated, selected by the model string. Faults can be injected to
//! exercise boot waits, misreporting reloads and failing commits.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ap_core::radio::{command_label, CommandRunner, ConfigStore, HardwareProfile, RadioFuture};
use ap_core::station::station_vlan;
use ap_core::{AllianceVlans, RadioError, RadioResult, Station};

/// Two samples one second apart with no traffic.
const IDLE_BANDWIDTH_REPORT: &str =
    "[ 1700000000, 0, 0, 0, 0 ],\n[ 1700000001, 0, 0, 0, 0 ]\n";

const NO_CLIENT_REPORT: &str = "No station connected\n";

struct Inner {
    profile: HardwareProfile,
    committed: BTreeMap<String, String>,
    staged: Vec<(String, String)>,
    live_ssids: HashMap<String, String>,
    boot_polls_remaining: u32,
    misreported_reloads: u32,
    fail_commits: bool,
    failing_commands: Vec<String>,
    assoc_reports: HashMap<String, String>,
    bandwidth_reports: HashMap<String, String>,
    reload_count: u32,
    commit_count: u32,
    reload_history: Vec<Vec<String>>,
    command_log: Vec<String>,
}

/// Simulated access point implementing both the configuration store and
/// the command surface. Clones share the same device.
#[derive(Clone)]
pub struct DummyAccessPoint {
    inner: Arc<Mutex<Inner>>,
}

fn option_path(section: &str, instance: &str, key: &str) -> String {
    format!("{}.{}.{}", section, instance, key)
}

fn station_option(station: Station, key: &str) -> String {
    option_path("wireless", &station.wifi_iface_section(), key)
}

impl DummyAccessPoint {
    /// Factory-fresh device reporting `model`. An empty model leaves the
    /// system model unset.
    pub fn new(model: &str) -> Self {
        let profile = HardwareProfile::from_model(model);
        let device = profile.device();
        let mut committed = BTreeMap::new();
        if !model.is_empty() {
            committed.insert(option_path("system", "@system[0]", "model"), model.to_string());
        }
        committed.insert(option_path("wireless", device, "channel"), "36".to_string());
        committed.insert(option_path("wireless", device, "htmode"), "HT20".to_string());

        let mut live_ssids = HashMap::new();
        for station in Station::ALL {
            let placeholder = station.placeholder_ssid();
            let vlan = station_vlan(
                station,
                Some(AllianceVlans::Vlans102030),
                Some(AllianceVlans::Vlans405060),
            );
            committed.insert(station_option(station, "ssid"), placeholder.clone());
            committed.insert(station_option(station, "key"), placeholder.clone());
            committed.insert(station_option(station, "network"), format!("vlan{}", vlan));
            live_ssids.insert(profile.interface_for(station).to_string(), placeholder);
        }

        Self {
            inner: Arc::new(Mutex::new(Inner {
                profile,
                committed,
                staged: Vec::new(),
                live_ssids,
                boot_polls_remaining: 0,
                misreported_reloads: 0,
                fail_commits: false,
                failing_commands: Vec::new(),
                assoc_reports: HashMap::new(),
                bandwidth_reports: HashMap::new(),
                reload_count: 0,
                commit_count: 0,
                reload_history: Vec::new(),
                command_log: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn profile(&self) -> HardwareProfile {
        self.lock().profile
    }

    /// Radio stays down for the next `polls` interface queries.
    pub fn set_boot_polls(&self, polls: u32) {
        self.lock().boot_polls_remaining = polls;
    }

    /// The next `reloads` reloads leave the broadcast SSIDs unchanged.
    pub fn misreport_next_reloads(&self, reloads: u32) {
        self.lock().misreported_reloads = reloads;
    }

    pub fn set_fail_commits(&self, fail: bool) {
        self.lock().fail_commits = fail;
    }

    /// Every command whose command line starts with `prefix` fails.
    pub fn fail_command(&self, prefix: &str) {
        self.lock().failing_commands.push(prefix.to_string());
    }

    pub fn set_assoc_report(&self, station: Station, report: &str) {
        let mut inner = self.lock();
        let iface = inner.profile.interface_for(station);
        inner.assoc_reports.insert(iface.to_string(), report.to_string());
    }

    pub fn set_bandwidth_report(&self, station: Station, report: &str) {
        let mut inner = self.lock();
        let iface = inner.profile.interface_for(station);
        inner.bandwidth_reports.insert(iface.to_string(), report.to_string());
    }

    /// Change what a station broadcasts without going through the store.
    pub fn set_live_ssid(&self, station: Station, ssid: &str) {
        let mut inner = self.lock();
        let iface = inner.profile.interface_for(station);
        inner.live_ssids.insert(iface.to_string(), ssid.to_string());
    }

    pub fn live_ssid(&self, station: Station) -> Option<String> {
        let inner = self.lock();
        inner
            .live_ssids
            .get(inner.profile.interface_for(station))
            .cloned()
    }

    /// Committed value of an option.
    pub fn committed(&self, section: &str, instance: &str, key: &str) -> Option<String> {
        self.lock()
            .committed
            .get(&option_path(section, instance, key))
            .cloned()
    }

    pub fn reload_count(&self) -> u32 {
        self.lock().reload_count
    }

    pub fn commit_count(&self) -> u32 {
        self.lock().commit_count
    }

    /// Broadcast SSIDs in station order after each reload.
    pub fn reload_history(&self) -> Vec<Vec<String>> {
        self.lock().reload_history.clone()
    }

    pub fn command_log(&self) -> Vec<String> {
        self.lock().command_log.clone()
    }
}

impl Inner {
    fn iface_info(&mut self, iface: &str, label: &str) -> RadioResult<String> {
        if self.boot_polls_remaining > 0 {
            self.boot_polls_remaining -= 1;
            return Err(RadioError::command(label, "No such wireless device"));
        }
        let ssid = self
            .live_ssids
            .get(iface)
            .ok_or_else(|| RadioError::command(label, "No such wireless device"))?;
        let channel = self
            .committed
            .get(&option_path("wireless", self.profile.device(), "channel"))
            .map(String::as_str)
            .unwrap_or("auto");
        Ok(format!(
            "{iface}     ESSID: \"{ssid}\"\n          Access Point: 02:00:00:00:00:01\n          Mode: Master  Channel: {channel}\n"
        ))
    }

    fn reload(&mut self, device: &str, label: &str) -> RadioResult<String> {
        if device != self.profile.device() {
            return Err(RadioError::command(label, "unknown device"));
        }
        self.reload_count += 1;
        if self.misreported_reloads > 0 {
            self.misreported_reloads -= 1;
        } else {
            for station in Station::ALL {
                if let Some(ssid) = self.committed.get(&station_option(station, "ssid")) {
                    self.live_ssids
                        .insert(self.profile.interface_for(station).to_string(), ssid.clone());
                }
            }
        }
        let snapshot = Station::ALL
            .iter()
            .map(|s| {
                self.live_ssids
                    .get(self.profile.interface_for(*s))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        self.reload_history.push(snapshot);
        Ok(String::new())
    }

    fn execute(&mut self, program: &str, args: &[&str]) -> RadioResult<String> {
        let label = command_label(program, args);
        self.command_log.push(label.clone());
        if self.failing_commands.iter().any(|p| label.starts_with(p.as_str())) {
            return Err(RadioError::command(&label, "exit status: 1"));
        }

        match (program, args) {
            ("iwinfo", [iface, "info"]) => self.iface_info(iface, &label),
            ("iwinfo", [iface, "assoclist"]) => Ok(self
                .assoc_reports
                .get(*iface)
                .map(String::as_str)
                .unwrap_or(NO_CLIENT_REPORT)
                .to_string()),
            ("luci-bwc", ["-i", iface]) => Ok(self
                .bandwidth_reports
                .get(*iface)
                .map(String::as_str)
                .unwrap_or(IDLE_BANDWIDTH_REPORT)
                .to_string()),
            ("wifi", ["reload", device]) => self.reload(device, &label),
            ("/etc/init.d/log", ["restart"]) => Ok(String::new()),
            _ => Err(RadioError::command(&label, "command not found")),
        }
    }
}

impl CommandRunner for DummyAccessPoint {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> RadioFuture<'a, String> {
        let result = self.lock().execute(program, args);
        Box::pin(async move { result })
    }
}

impl ConfigStore for DummyAccessPoint {
    fn get<'a>(
        &'a mut self,
        section: &'a str,
        instance: &'a str,
        key: &'a str,
    ) -> RadioFuture<'a, Option<String>> {
        let path = option_path(section, instance, key);
        let inner = self.lock();
        let value = inner
            .staged
            .iter()
            .rev()
            .find(|(p, _)| *p == path)
            .map(|(_, v)| v.clone())
            .or_else(|| inner.committed.get(&path).cloned());
        Box::pin(async move { Ok(value) })
    }

    fn set(&mut self, section: &str, instance: &str, key: &str, value: &str) {
        self.lock()
            .staged
            .push((option_path(section, instance, key), value.to_string()));
    }

    fn commit<'a>(&'a mut self) -> RadioFuture<'a, ()> {
        let mut inner = self.lock();
        let staged = std::mem::take(&mut inner.staged);
        let result = if inner.fail_commits {
            Err(RadioError::store("commit rejected"))
        } else {
            inner.commit_count += 1;
            inner.committed.extend(staged);
            Ok(())
        };
        drop(inner);
        Box::pin(async move { result })
    }
}
