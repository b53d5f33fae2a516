// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Radio controller components.
//!
//! This module contains the configuration lifecycle state machine, the
//! event notification system and the retry/polling policies used by the
//! radio task.

pub mod events;
pub mod machine;
pub mod policies;

pub use events::{RadioEventEmitter, RadioListener};
pub use machine::{RadioEvent, RadioStateError, RadioStateMachine};
pub use policies::{FixedDelay, FixedPolling, NoPolling, PollingPolicy, RetryPolicy};
