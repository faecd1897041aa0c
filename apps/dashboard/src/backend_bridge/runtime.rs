//! Runtime bridge between the console command queue and the orchestrator.
//!
//! The worker thread owns a multi-thread tokio runtime. Surface commands run inline in queue
//! order; network commands are spawned so a long mining job never holds up `stop`.

use std::{sync::Arc, thread, time::Duration};

use control_core::{CommandBridge, Orchestrator, RelayEvent, RelayEvents, SurfaceTransition};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use futures::StreamExt;
use shared::error::BridgeError;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

const UI_QUEUE_RETRY: Duration = Duration::from_millis(10);

pub fn launch(
    orchestrator: Orchestrator,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(Arc::new(orchestrator), cmd_rx, ui_tx));
    })
}

async fn run_worker(
    orchestrator: Arc<Orchestrator>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let (streams_tx, streams_rx) = mpsc::unbounded_channel::<RelayEvents>();
    tokio::spawn(pump_relay_events(streams_rx, ui_tx.clone()));
    tokio::spawn(forward_shutdown(Arc::clone(&orchestrator), ui_tx.clone()));

    // Held across connect-and-hand-off so streams reach the pump in connection order.
    let relay_gate = Arc::new(AsyncMutex::new(streams_tx));

    let _ = ui_tx.try_send(UiEvent::SurfacesChanged(orchestrator.surface_state()));
    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "backend worker: command received");
        match cmd {
            BackendCommand::CheckStatus => {
                let orchestrator = Arc::clone(&orchestrator);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let readiness = orchestrator.check_status().await;
                    let _ = ui_tx.try_send(UiEvent::Readiness(readiness));
                });
            }
            BackendCommand::Launch => match orchestrator.open_surface().await {
                Ok(opened) => {
                    report_transition(&ui_tx, &opened);
                    let closed = orchestrator.close_surface().await;
                    report_transition(&ui_tx, &closed);
                }
                Err(err) => report_error(&ui_tx, UiErrorContext::Surface, &err),
            },
            BackendCommand::OpenDashboard => match orchestrator.open_surface().await {
                Ok(transition) => report_transition(&ui_tx, &transition),
                Err(err) => report_error(&ui_tx, UiErrorContext::Surface, &err),
            },
            BackendCommand::CloseLauncher => {
                let transition = orchestrator.close_surface().await;
                report_transition(&ui_tx, &transition);
            }
            BackendCommand::CloseDashboard => {
                let transition = orchestrator.dashboard_closed().await;
                report_transition(&ui_tx, &transition);
            }
            BackendCommand::Reactivate => match orchestrator.reactivate() {
                Ok(transition) if transition.is_noop() => {
                    let _ = ui_tx.try_send(UiEvent::Info(
                        "A window is already open; nothing to reactivate".to_string(),
                    ));
                }
                Ok(transition) => report_transition(&ui_tx, &transition),
                Err(err) => report_error(&ui_tx, UiErrorContext::Surface, &err),
            },
            BackendCommand::ConnectRelay { address } => {
                let orchestrator = Arc::clone(&orchestrator);
                let relay_gate = Arc::clone(&relay_gate);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let Ok(streams_tx) = relay_gate.try_lock() else {
                        report_error(&ui_tx, UiErrorContext::Relay, &BridgeError::Busy);
                        return;
                    };
                    match orchestrator.connect_relay(address.as_deref()).await {
                        Ok(events) => {
                            let _ = streams_tx.send(events);
                        }
                        Err(err) => report_error(&ui_tx, UiErrorContext::Relay, &err),
                    }
                });
            }
            BackendCommand::DisconnectRelay => {
                let orchestrator = Arc::clone(&orchestrator);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = orchestrator.disconnect_relay().await {
                        report_error(&ui_tx, UiErrorContext::Relay, &err);
                    }
                });
            }
            BackendCommand::StartJob { difficulty } => {
                let _ = ui_tx.try_send(UiEvent::JobStarted { difficulty });
                let orchestrator = Arc::clone(&orchestrator);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    match orchestrator.start_job(difficulty).await {
                        Ok(result) => {
                            let _ = ui_tx.try_send(UiEvent::JobFinished(result));
                        }
                        Err(err) => report_error(&ui_tx, UiErrorContext::Job, &err),
                    }
                });
            }
            BackendCommand::StopJob => {
                let orchestrator = Arc::clone(&orchestrator);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    match orchestrator.stop_job().await {
                        Ok(ack) => {
                            let _ = ui_tx.try_send(UiEvent::JobStopAcknowledged(ack));
                        }
                        Err(err) => report_error(&ui_tx, UiErrorContext::Job, &err),
                    }
                });
            }
            BackendCommand::FetchStats => {
                let orchestrator = Arc::clone(&orchestrator);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    match orchestrator.fetch_stats().await {
                        Ok(stats) => {
                            let _ = ui_tx.try_send(UiEvent::StatsFetched(stats));
                        }
                        Err(err) => report_error(&ui_tx, UiErrorContext::Stats, &err),
                    }
                });
            }
            BackendCommand::Terminate => orchestrator.terminate().await,
        }
    }
    tracing::debug!("backend worker: command queue closed");
}

/// Drains one connection's events to completion before taking the next connection's.
///
/// Stats frames are dropped while the UI queue is full; state changes wait for room.
async fn pump_relay_events(mut streams_rx: mpsc::UnboundedReceiver<RelayEvents>, ui_tx: Sender<UiEvent>) {
    while let Some(mut events) = streams_rx.recv().await {
        while let Some(event) = events.next().await {
            let delivered = match event {
                RelayEvent::StateChanged(state) => {
                    deliver_when_room(&ui_tx, UiEvent::RelayStateChanged(state)).await
                }
                RelayEvent::StatsReceived(stats) => match ui_tx.try_send(UiEvent::RelayStats(stats)) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        tracing::debug!("relay pump: UI queue full, dropping stats frame");
                        true
                    }
                    Err(TrySendError::Disconnected(_)) => false,
                },
            };
            if !delivered {
                return;
            }
        }
    }
}

async fn deliver_when_room(ui_tx: &Sender<UiEvent>, mut event: UiEvent) -> bool {
    loop {
        match ui_tx.try_send(event) {
            Ok(()) => return true,
            Err(TrySendError::Full(pending)) => {
                event = pending;
                tokio::time::sleep(UI_QUEUE_RETRY).await;
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }
    }
}

async fn forward_shutdown(orchestrator: Arc<Orchestrator>, ui_tx: Sender<UiEvent>) {
    let mut shutdown = orchestrator.subscribe_shutdown();
    loop {
        let reason = *shutdown.borrow_and_update();
        if let Some(reason) = reason {
            tracing::info!(?reason, "backend worker: forwarding shutdown");
            deliver_when_room(&ui_tx, UiEvent::Shutdown(reason)).await;
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

fn report_transition(ui_tx: &Sender<UiEvent>, transition: &SurfaceTransition) {
    if transition.from != transition.to {
        let _ = ui_tx.try_send(UiEvent::SurfacesChanged(transition.to));
    }
}

fn report_error(ui_tx: &Sender<UiEvent>, context: UiErrorContext, err: &BridgeError) {
    tracing::warn!(%context, error = %err, "backend command failed");
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_bridge(context, err)));
}
