// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::Serialize;
use thiserror::Error;

/// Error type returned by radio operations.
#[derive(Debug, Clone, Error, Serialize)]
pub enum RadioError {
    #[error("unable to determine radio hardware type: {0}")]
    UnknownHardware(String),

    #[error("invalid configuration request: {0}")]
    InvalidRequest(String),

    #[error("configuration store error: {0}")]
    Store(String),

    #[error("command '{command}' failed: {message}")]
    Command { command: String, message: String },

    #[error("error parsing output of '{command}': {output}")]
    Parse { command: String, output: String },

    #[error("failed to configure stations after {attempts} attempts")]
    NotConverged { attempts: u32 },

    #[error("radio controller unavailable: {0}")]
    Unavailable(String),
}

pub type RadioResult<T> = Result<T, RadioError>;

impl RadioError {
    pub fn unknown_hardware(message: impl Into<String>) -> Self {
        Self::UnknownHardware(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn parse(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Parse {
            command: command.into(),
            output: output.into(),
        }
    }

    pub fn not_converged(attempts: u32) -> Self {
        Self::NotConverged { attempts }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Whether another attempt may succeed without outside intervention.
    /// Only a device that has not yet caught up qualifies; store and
    /// command failures sit below the reconciliation layer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotConverged { .. })
    }
}
