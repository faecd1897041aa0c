use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{ReadinessVector, RelayState, ShutdownReason, SurfaceState},
    error::BridgeError,
    protocol::{MiningJobResult, StatsSnapshot},
};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{info, warn};

pub mod backend;
pub mod config;
pub mod prober;
pub mod relay;
pub mod surface;

pub use backend::BackendClient;
pub use config::{load_settings, Settings};
pub use prober::BackendProber;
pub use relay::{RelayChannel, RelayEvent, RelayEvents, RelayObserver};
pub use surface::{
    HeadlessSurfaceHost, SurfaceEffect, SurfaceHost, SurfaceLifecycle, SurfaceTransition,
};

/// Difficulties the backend search is meaningful for. Callers check this; the bridge does not.
pub const DIFFICULTY_RANGE: RangeInclusive<i64> = 1..=32;

pub fn validate_difficulty(difficulty: i64) -> Result<i64, String> {
    if DIFFICULTY_RANGE.contains(&difficulty) {
        Ok(difficulty)
    } else {
        Err(format!(
            "Difficulty must be between {} and {}",
            DIFFICULTY_RANGE.start(),
            DIFFICULTY_RANGE.end()
        ))
    }
}

/// Operations a UI surface may invoke. Nothing here hands out network capability.
#[async_trait]
pub trait CommandBridge: Send + Sync {
    async fn check_status(&self) -> ReadinessVector;
    async fn open_surface(&self) -> Result<SurfaceTransition, BridgeError>;
    async fn close_surface(&self) -> SurfaceTransition;
    async fn terminate(&self);
    /// Settles the connection (Connected or Failed) before returning its event stream.
    async fn connect_relay(&self, address: Option<&str>) -> Result<RelayEvents, BridgeError>;
    async fn disconnect_relay(&self) -> Result<(), BridgeError>;
    async fn start_job(&self, difficulty: i64) -> Result<MiningJobResult, BridgeError>;
    async fn stop_job(&self) -> Result<serde_json::Value, BridgeError>;
    async fn fetch_stats(&self) -> Result<StatsSnapshot, BridgeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorStatus {
    pub surfaces: SurfaceState,
    pub relay: RelayState,
    pub shutdown: Option<ShutdownReason>,
}

pub struct Orchestrator {
    settings: Settings,
    prober: BackendProber,
    backend: BackendClient,
    relay: AsyncMutex<RelayChannel>,
    relay_observer: RelayObserver,
    surfaces: Mutex<SurfaceLifecycle>,
    host: Arc<dyn SurfaceHost>,
    shutdown: watch::Sender<Option<ShutdownReason>>,
}

impl Orchestrator {
    pub fn new(settings: Settings) -> Self {
        Self::with_surface_host(settings, Arc::new(HeadlessSurfaceHost))
    }

    pub fn with_surface_host(settings: Settings, host: Arc<dyn SurfaceHost>) -> Self {
        let http = Client::new();
        let prober = BackendProber::new(http.clone(), settings.status_url(), settings.probe_timeout);
        let backend = BackendClient::new(
            http,
            settings.backend_url.clone(),
            settings.request_timeout,
            settings.job_timeout,
        );
        let relay = RelayChannel::new(settings.relay_connect_timeout);
        let relay_observer = relay.observer();
        let (shutdown, _) = watch::channel(None);

        Self {
            settings,
            prober,
            backend,
            relay: AsyncMutex::new(relay),
            relay_observer,
            surfaces: Mutex::new(SurfaceLifecycle::new()),
            host,
            shutdown,
        }
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            surfaces: self.surface_state(),
            relay: self.relay_observer.state(),
            shutdown: *self.shutdown.borrow(),
        }
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.lock_surfaces().state()
    }

    pub fn relay_state(&self) -> RelayState {
        self.relay_observer.state()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<Option<ShutdownReason>> {
        self.shutdown.subscribe()
    }

    /// External close of the dashboard surface. The relay does not outlive its dashboard.
    pub async fn dashboard_closed(&self) -> SurfaceTransition {
        let transition = {
            let mut surfaces = self.lock_surfaces();
            let transition = surfaces.close_dashboard();
            surfaces.commit(&transition);
            transition
        };
        if !transition.is_noop() {
            self.release_relay().await;
        }
        self.after_transition(&transition);
        transition
    }

    /// Platform activation with no live surface brings the launcher back.
    pub fn reactivate(&self) -> Result<SurfaceTransition, BridgeError> {
        let transition = {
            let mut surfaces = self.lock_surfaces();
            let transition = surfaces.reactivate();
            self.create_surface(&transition)?;
            surfaces.commit(&transition);
            transition
        };
        self.after_transition(&transition);
        Ok(transition)
    }

    fn lock_surfaces(&self) -> MutexGuard<'_, SurfaceLifecycle> {
        self.surfaces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_surface(&self, transition: &SurfaceTransition) -> Result<(), BridgeError> {
        if let Some(SurfaceEffect::Create(kind)) = transition.effect {
            self.host.create(kind).map_err(|err| {
                warn!(?kind, error = %err, "surface: creation failed");
                BridgeError::SurfaceUnavailable(format!("failed to create {kind:?} surface: {err}"))
            })?;
        }
        Ok(())
    }

    fn after_transition(&self, transition: &SurfaceTransition) {
        match transition.effect {
            Some(SurfaceEffect::Focus(kind)) => self.host.focus(kind),
            Some(SurfaceEffect::Destroy(kind)) => self.host.destroy(kind),
            Some(SurfaceEffect::Create(_)) | None => {}
        }
        if transition.is_noop() {
            return;
        }

        info!(from = ?transition.from, to = ?transition.to, "surface: transition");
        if transition.reached_empty() {
            if self.settings.persist_without_surfaces {
                info!("surface: no live surface, staying alive until reactivated");
            } else {
                self.request_shutdown(ShutdownReason::LastSurfaceClosed);
            }
        }
    }

    fn request_shutdown(&self, reason: ShutdownReason) {
        let first = self.shutdown.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if first {
            info!(?reason, "orchestrator: shutdown requested");
        }
    }

    /// Waits for any in-flight relay operation, then closes the relay if one is open.
    async fn release_relay(&self) {
        let mut relay = self.relay.lock().await;
        match relay.close().await {
            Ok(()) => info!("relay: released"),
            Err(BridgeError::NotConnected) => {}
            Err(err) => warn!(error = %err, "relay: release failed"),
        }
    }
}

#[async_trait]
impl CommandBridge for Orchestrator {
    async fn check_status(&self) -> ReadinessVector {
        self.prober.probe().await
    }

    async fn open_surface(&self) -> Result<SurfaceTransition, BridgeError> {
        let transition = {
            let mut surfaces = self.lock_surfaces();
            let transition = surfaces.open_dashboard()?;
            self.create_surface(&transition)?;
            surfaces.commit(&transition);
            transition
        };
        self.after_transition(&transition);
        Ok(transition)
    }

    async fn close_surface(&self) -> SurfaceTransition {
        let transition = {
            let mut surfaces = self.lock_surfaces();
            let transition = surfaces.close_launcher();
            surfaces.commit(&transition);
            transition
        };
        self.after_transition(&transition);
        transition
    }

    async fn terminate(&self) {
        self.request_shutdown(ShutdownReason::Terminated);
        self.release_relay().await;
    }

    async fn connect_relay(&self, address: Option<&str>) -> Result<RelayEvents, BridgeError> {
        let mut relay = self.relay.try_lock().map_err(|_| BridgeError::Busy)?;
        let address = address.unwrap_or(&self.settings.relay_url);
        relay.connect(address).await
    }

    async fn disconnect_relay(&self) -> Result<(), BridgeError> {
        let mut relay = self.relay.try_lock().map_err(|_| BridgeError::Busy)?;
        relay.close().await
    }

    async fn start_job(&self, difficulty: i64) -> Result<MiningJobResult, BridgeError> {
        self.backend.start_job(difficulty).await
    }

    async fn stop_job(&self) -> Result<serde_json::Value, BridgeError> {
        self.backend.stop_job().await
    }

    async fn fetch_stats(&self) -> Result<StatsSnapshot, BridgeError> {
        self.backend.fetch_stats().await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
