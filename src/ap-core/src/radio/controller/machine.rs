// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Radio state machine for configuration lifecycle management.
//!
//! ```text
//! BOOTING --Started--> ACTIVE --ConfigurationRequested--> CONFIGURING
//!                        ^                                   |
//!                        +------ConfigurationSucceeded-------+
//!                                                            |
//! ERROR <------------ConfigurationFailed---------------------+
//!   |
//!   +--ConfigurationRequested--> CONFIGURING
//! ```

use crate::radio::state::RadioStatus;

/// Events that can trigger state transitions in the radio state machine.
#[derive(Debug, Clone)]
pub enum RadioEvent {
    /// Wi-Fi interfaces came up after boot
    Started,
    /// A configuration request is about to be applied
    ConfigurationRequested,
    /// Device state matches the request
    ConfigurationSucceeded,
    /// Applying the request failed or never converged
    ConfigurationFailed(RadioStateError),
}

/// Why the last configuration ended in ERROR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioStateError {
    pub message: String,
}

impl RadioStateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The radio state machine that manages status transitions.
#[derive(Debug, Clone)]
pub struct RadioStateMachine {
    status: RadioStatus,
    last_error: Option<RadioStateError>,
}

impl Default for RadioStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioStateMachine {
    /// Create a new state machine in the Booting state.
    pub fn new() -> Self {
        Self {
            status: RadioStatus::Booting,
            last_error: None,
        }
    }

    pub fn status(&self) -> RadioStatus {
        self.status
    }

    /// Failure behind the current ERROR status. Kept through the next
    /// CONFIGURING phase and cleared once a configuration succeeds.
    pub fn last_error(&self) -> Option<&RadioStateError> {
        self.last_error.as_ref()
    }

    /// Process an event and potentially transition to a new status.
    /// Returns true if a transition occurred.
    pub fn process_event(&mut self, event: RadioEvent) -> bool {
        let next = match (self.status, event) {
            (RadioStatus::Booting, RadioEvent::Started) => Some((RadioStatus::Active, None)),

            (RadioStatus::Active | RadioStatus::Error, RadioEvent::ConfigurationRequested) => {
                Some((RadioStatus::Configuring, self.last_error.clone()))
            }

            (RadioStatus::Configuring, RadioEvent::ConfigurationSucceeded) => {
                Some((RadioStatus::Active, None))
            }
            (RadioStatus::Configuring, RadioEvent::ConfigurationFailed(error)) => {
                Some((RadioStatus::Error, Some(error)))
            }

            // Invalid transition - stay in current state
            _ => None,
        };

        match next {
            Some((status, error)) => {
                self.status = status;
                self.last_error = error;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sm = RadioStateMachine::new();
        assert_eq!(sm.status(), RadioStatus::Booting);
        assert!(sm.last_error().is_none());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut sm = RadioStateMachine::new();

        assert!(sm.process_event(RadioEvent::Started));
        assert_eq!(sm.status(), RadioStatus::Active);

        assert!(sm.process_event(RadioEvent::ConfigurationRequested));
        assert_eq!(sm.status(), RadioStatus::Configuring);

        assert!(sm.process_event(RadioEvent::ConfigurationSucceeded));
        assert_eq!(sm.status(), RadioStatus::Active);
    }

    #[test]
    fn test_error_and_recovery() {
        let mut sm = RadioStateMachine::new();
        sm.process_event(RadioEvent::Started);
        sm.process_event(RadioEvent::ConfigurationRequested);

        sm.process_event(RadioEvent::ConfigurationFailed(RadioStateError::new(
            "failed to configure stations after 3 attempts",
        )));
        assert_eq!(sm.status(), RadioStatus::Error);
        assert_eq!(
            sm.last_error().map(|e| e.message.as_str()),
            Some("failed to configure stations after 3 attempts")
        );

        // Error remains visible while the next attempt runs.
        sm.process_event(RadioEvent::ConfigurationRequested);
        assert_eq!(sm.status(), RadioStatus::Configuring);
        assert!(sm.last_error().is_some());

        sm.process_event(RadioEvent::ConfigurationSucceeded);
        assert_eq!(sm.status(), RadioStatus::Active);
        assert!(sm.last_error().is_none());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = RadioStateMachine::new();

        // Can't configure before boot completes
        assert!(!sm.process_event(RadioEvent::ConfigurationRequested));
        assert_eq!(sm.status(), RadioStatus::Booting);

        sm.process_event(RadioEvent::Started);
        assert!(!sm.process_event(RadioEvent::Started));
        assert!(!sm.process_event(RadioEvent::ConfigurationSucceeded));
        assert_eq!(sm.status(), RadioStatus::Active);

        sm.process_event(RadioEvent::ConfigurationRequested);
        assert!(!sm.process_event(RadioEvent::ConfigurationRequested));
        assert_eq!(sm.status(), RadioStatus::Configuring);
    }
}
