// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod radio;
pub mod station;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use radio::request::{ConfigurationRequest, StationConfiguration};
pub use radio::response::{RadioError, RadioResult};
pub use radio::state::{ChannelBandwidth, RadioState, RadioStatus, StationStatus};
pub use radio::{CommandRunner, ConfigStore, HardwareProfile};
pub use station::{Alliance, AllianceVlans, Station};
