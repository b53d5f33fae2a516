// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Radio task: the single owner of the access point.
//!
//! Waits for the radio to come up, then alternates between applying
//! queued configuration requests and polling station telemetry. Readers
//! observe the published [`RadioState`] through a watch channel; it is
//! only replaced at the start of a configuration and at the end of each
//! completed phase.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use ap_core::radio::controller::{
    FixedPolling, PollingPolicy, RadioEvent, RadioEventEmitter, RadioListener,
    RadioStateError, RadioStateMachine,
};
use ap_core::{ConfigurationRequest, DynResult, RadioState, RadioStatus};

use crate::device::RadioDevice;
use crate::reconcile::{self, ReconcileTiming};

/// Configuration for the radio task.
pub struct RadioTaskConfig {
    /// Readiness checks while the radio boots.
    pub boot_polling: FixedPolling,
    /// Station telemetry polling once the radio is up.
    pub polling: Box<dyn PollingPolicy>,
    pub timing: ReconcileTiming,
    pub listeners: Vec<Arc<dyn RadioListener>>,
}

/// Run the radio task until every request sender is gone.
pub async fn run_radio_task(
    config: RadioTaskConfig,
    mut device: RadioDevice,
    mut rx: mpsc::Receiver<ConfigurationRequest>,
    state_tx: watch::Sender<RadioState>,
) -> DynResult<()> {
    let mut machine = RadioStateMachine::new();
    let mut emitter = RadioEventEmitter::new();
    for listener in &config.listeners {
        emitter.register(listener.clone());
    }
    let mut state = state_tx.borrow().clone();
    state.profile = device.profile();

    info!("Waiting for {} radio to start", device.profile());
    while !device.is_started().await {
        time::sleep(config.boot_polling.interval()).await;
    }

    device.read_settings(&mut state).await?;
    device.read_vlan_groups(&mut state).await?;
    let old_stations = state.station_statuses.clone();
    if let Err(e) = reconcile::update_station_statuses(&mut device, &mut state).await {
        warn!("Initial station status refresh failed: {}", e);
    }
    emitter.notify_station_changes(&old_stations, &state.station_statuses);
    transition(&mut machine, &emitter, &mut state, RadioEvent::Started);
    state_tx.send_replace(state.clone());
    info!(
        "Radio ready on channel {} ({} stations assigned)",
        state.channel,
        state.assigned_stations().count()
    );

    let polling = config.polling.as_ref();
    let mut poll_sleep = Box::pin(time::sleep(polling.interval()));
    let mut pending: Option<ConfigurationRequest> = None;
    loop {
        let first = match pending.take() {
            Some(request) => request,
            None => tokio::select! {
                _ = &mut poll_sleep => {
                    poll_sleep = Box::pin(time::sleep(polling.interval()));
                    if polling.should_poll() {
                        reconcile::update_station_monitoring(&device, &mut state).await;
                        state_tx.send_replace(state.clone());
                    }
                    continue;
                }
                maybe_req = rx.recv() => {
                    let Some(request) = maybe_req else { break; };
                    request
                }
            },
        };

        let request = newest_request(first, &mut rx);
        let mut ctx = TaskContext {
            device: &mut device,
            state: &mut state,
            machine: &mut machine,
            emitter: &emitter,
            state_tx: &state_tx,
            timing: &config.timing,
        };
        pending = process_request(request, &mut rx, &mut ctx).await;
    }

    info!("radio_task shutting down (channel closed)");
    Ok(())
}

/// Keep only the most recent of the queued requests.
fn newest_request(
    first: ConfigurationRequest,
    rx: &mut mpsc::Receiver<ConfigurationRequest>,
) -> ConfigurationRequest {
    let mut newest = first;
    let mut superseded = 0;
    while let Ok(next) = rx.try_recv() {
        newest = next;
        superseded += 1;
    }
    if superseded > 0 {
        info!("Discarding {} superseded configuration request(s)", superseded);
    }
    newest
}

struct TaskContext<'a> {
    device: &'a mut RadioDevice,
    state: &'a mut RadioState,
    machine: &'a mut RadioStateMachine,
    emitter: &'a RadioEventEmitter,
    state_tx: &'a watch::Sender<RadioState>,
    timing: &'a ReconcileTiming,
}

/// Apply one request. Returns the next request if one arrived while this
/// one was being applied successfully; the radio then stays CONFIGURING.
async fn process_request(
    request: ConfigurationRequest,
    rx: &mut mpsc::Receiver<ConfigurationRequest>,
    ctx: &mut TaskContext<'_>,
) -> Option<ConfigurationRequest> {
    if let Err(e) = request.validate() {
        warn!("Rejected configuration request: {}", e);
        // Reached only right after a successful configuration.
        if ctx.machine.status() == RadioStatus::Configuring {
            transition(ctx.machine, ctx.emitter, ctx.state, RadioEvent::ConfigurationSucceeded);
            ctx.state_tx.send_replace(ctx.state.clone());
        }
        return None;
    }

    if ctx.machine.status() != RadioStatus::Configuring {
        transition(ctx.machine, ctx.emitter, ctx.state, RadioEvent::ConfigurationRequested);
        ctx.state_tx.send_replace(ctx.state.clone());
    }

    debug!("Applying configuration request: {:?}", request);
    let started = Instant::now();
    let old_stations = ctx.state.station_statuses.clone();
    let result = reconcile::configure(ctx.device, ctx.state, &request, ctx.timing).await;
    if let Err(e) = ctx.device.read_settings(ctx.state).await {
        warn!("Failed to read back device settings: {}", e);
    }
    ctx.emitter
        .notify_station_changes(&old_stations, &ctx.state.station_statuses);

    let pending = match result {
        Ok(()) => {
            info!("Configuration applied in {:?}", started.elapsed());
            match rx.try_recv() {
                Ok(next) => {
                    info!("Another configuration request is queued; staying in CONFIGURING");
                    Some(next)
                }
                Err(_) => {
                    transition(
                        ctx.machine,
                        ctx.emitter,
                        ctx.state,
                        RadioEvent::ConfigurationSucceeded,
                    );
                    None
                }
            }
        }
        Err(e) => {
            error!("Configuration failed after {:?}: {}", started.elapsed(), e);
            transition(
                ctx.machine,
                ctx.emitter,
                ctx.state,
                RadioEvent::ConfigurationFailed(RadioStateError::new(e.to_string())),
            );
            None
        }
    };
    ctx.state_tx.send_replace(ctx.state.clone());
    pending
}

fn transition(
    machine: &mut RadioStateMachine,
    emitter: &RadioEventEmitter,
    state: &mut RadioState,
    event: RadioEvent,
) {
    let old = machine.status();
    if machine.process_event(event) {
        state.status = machine.status();
        debug!("Radio status {} -> {}", old, state.status);
        if old == RadioStatus::Error {
            if let Some(failure) = machine.last_error() {
                info!("Retrying after failed configuration: {}", failure.message);
            }
        }
        emitter.notify_status_change(old, state.status);
    }
}
