// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Radio event notification system.
//!
//! Typed notifications for status transitions and station assignment
//! changes, so other components can react without diffing snapshots.

use std::sync::Arc;

use crate::radio::state::{RadioStatus, StationStatus, StationStatuses};
use crate::station::Station;

/// Trait for components that want to receive radio events.
///
/// All methods have default no-op implementations, so listeners can
/// selectively override only the events they care about.
pub trait RadioListener: Send + Sync {
    /// Called when the radio status transitions.
    fn on_status_change(&self, _old: RadioStatus, _new: RadioStatus) {}

    /// Called when a team network appears on a station or its SSID changes.
    fn on_station_assigned(&self, _station: Station, _status: &StationStatus) {}

    /// Called when a station loses its team network.
    fn on_station_cleared(&self, _station: Station) {}
}

/// Manages registered listeners and dispatches events.
pub struct RadioEventEmitter {
    listeners: Vec<Arc<dyn RadioListener>>,
}

impl Default for RadioEventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioEventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: Arc<dyn RadioListener>) {
        self.listeners.push(listener);
    }

    pub fn notify_status_change(&self, old: RadioStatus, new: RadioStatus) {
        if old == new {
            return;
        }
        for listener in &self.listeners {
            listener.on_status_change(old, new);
        }
    }

    /// Notify about every station whose assignment differs between the
    /// two maps. Telemetry-only differences are not reported.
    pub fn notify_station_changes(&self, old: &StationStatuses, new: &StationStatuses) {
        for (station, new_status) in new {
            let old_ssid = old
                .get(station)
                .and_then(Option::as_ref)
                .map(|s| s.ssid.as_str());
            match new_status {
                Some(status) if old_ssid != Some(status.ssid.as_str()) => {
                    for listener in &self.listeners {
                        listener.on_station_assigned(*station, status);
                    }
                }
                None if old_ssid.is_some() => {
                    for listener in &self.listeners {
                        listener.on_station_cleared(*station);
                    }
                }
                _ => {}
            }
        }
    }
}
