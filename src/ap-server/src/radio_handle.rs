// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Thin handle giving other components access to the radio task and its
//! published state.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use ap_core::{ConfigurationRequest, RadioError, RadioResult, RadioState};

/// A cloneable handle to the running radio task.
#[derive(Clone)]
pub struct RadioHandle {
    /// Send configuration requests to the radio task.
    pub request_tx: mpsc::Sender<ConfigurationRequest>,
    /// Watch the latest published radio state.
    pub state_rx: watch::Receiver<RadioState>,
}

impl RadioHandle {
    pub fn new(
        request_tx: mpsc::Sender<ConfigurationRequest>,
        state_rx: watch::Receiver<RadioState>,
    ) -> Self {
        Self {
            request_tx,
            state_rx,
        }
    }

    /// Queue a request without waiting.
    ///
    /// Invalid requests are rejected here and never reach the radio task. A
    /// full queue is reported back to the caller rather than waited on.
    pub fn submit(&self, request: ConfigurationRequest) -> RadioResult<()> {
        request.validate()?;
        self.request_tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => RadioError::unavailable("configuration queue is full"),
            TrySendError::Closed(_) => RadioError::unavailable("radio task has stopped"),
        })
    }

    /// Coherent copy of the current radio state.
    pub fn snapshot(&self) -> RadioState {
        self.state_rx.borrow().clone()
    }

    /// Current state as the JSON document served to status readers.
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.state_rx.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ap_core::{HardwareProfile, Station, StationConfiguration};

    fn handle(capacity: usize) -> (RadioHandle, mpsc::Receiver<ConfigurationRequest>) {
        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (_state_tx, state_rx) =
            watch::channel(RadioState::new(HardwareProfile::Linksys, "unknown"));
        (RadioHandle::new(request_tx, state_rx), request_rx)
    }

    fn valid_request() -> ConfigurationRequest {
        ConfigurationRequest::default()
            .with_station(Station::Red1, StationConfiguration::new("254", "password123"))
    }

    #[test]
    fn invalid_request_is_rejected_before_queueing() {
        let (handle, mut rx) = handle(10);
        let request = ConfigurationRequest::default()
            .with_station(Station::Red1, StationConfiguration::new("254", "short"));

        let err = handle.submit(request).unwrap_err();
        assert!(matches!(err, RadioError::InvalidRequest(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_is_reported() {
        let (handle, mut rx) = handle(1);
        handle.submit(valid_request()).unwrap();

        let err = handle.submit(valid_request()).unwrap_err();
        assert!(matches!(err, RadioError::Unavailable(_)));
        assert_eq!(rx.try_recv().unwrap(), valid_request());
    }

    #[test]
    fn stopped_task_is_reported() {
        let (handle, rx) = handle(1);
        drop(rx);
        assert!(matches!(
            handle.submit(valid_request()),
            Err(RadioError::Unavailable(_))
        ));
    }

    #[test]
    fn snapshot_json_omits_keys_and_profile() {
        let (handle, _rx) = handle(1);
        let json = handle.snapshot_json().unwrap();
        assert!(json.contains("\"status\":\"BOOTING\""));
        assert!(json.contains("\"version\":\"unknown\""));
        assert!(!json.contains("profile"));
        assert_eq!(handle.snapshot().status, ap_core::RadioStatus::Booting);
    }
}
