// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Pacing of the radio task: how often an unconverged station
//! configuration is re-applied, and how often telemetry is sampled.

use std::time::Duration;

use crate::radio::response::RadioError;

/// Attempts the access points usually need before they report what was
/// committed.
pub const RADIO_ATTEMPTS: u32 = 3;
/// Pause between two configuration attempts.
pub const RADIO_RETRY_PAUSE: Duration = Duration::from_secs(3);
/// Interval between two telemetry samples.
pub const TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Decides whether a failed configuration attempt is worth repeating.
pub trait RetryPolicy: Send + Sync {
    /// `attempt` is 1-based and has just failed with `error`.
    fn should_retry(&self, attempt: u32, error: &RadioError) -> bool;

    /// Pause before the attempt following `attempt`.
    fn delay(&self, attempt: u32) -> Duration;

    fn max_attempts(&self) -> u32;
}

/// Same pause between every attempt, up to a fixed budget.
///
/// Only transient errors are retried; a failed commit or reload ends the
/// configuration immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDelay {
    attempts: u32,
    pause: Duration,
}

impl FixedDelay {
    pub fn new(attempts: u32, pause: Duration) -> Self {
        Self { attempts, pause }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(RADIO_ATTEMPTS, RADIO_RETRY_PAUSE)
    }
}

impl RetryPolicy for FixedDelay {
    fn should_retry(&self, attempt: u32, error: &RadioError) -> bool {
        error.is_transient() && attempt < self.attempts
    }

    fn delay(&self, _attempt: u32) -> Duration {
        self.pause
    }

    fn max_attempts(&self) -> u32 {
        self.attempts
    }
}

/// Decides when station telemetry is sampled.
pub trait PollingPolicy: Send + Sync {
    fn interval(&self) -> Duration;

    /// `false` turns the poll timer into a no-op.
    fn should_poll(&self) -> bool;
}

/// Sample at a constant rate.
#[derive(Debug, Clone)]
pub struct FixedPolling {
    every: Duration,
}

impl FixedPolling {
    pub fn new(every: Duration) -> Self {
        Self { every }
    }
}

impl Default for FixedPolling {
    fn default() -> Self {
        Self::new(TELEMETRY_INTERVAL)
    }
}

impl PollingPolicy for FixedPolling {
    fn interval(&self) -> Duration {
        self.every
    }

    fn should_poll(&self) -> bool {
        !self.every.is_zero()
    }
}

/// Never sample; used where telemetry would only add noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPolling;

impl PollingPolicy for NoPolling {
    fn interval(&self) -> Duration {
        // Must still be a valid sleep deadline.
        Duration::from_secs(86_400)
    }

    fn should_poll(&self) -> bool {
        false
    }
}
