//! Launcher/dashboard lifecycle: at most one surface of each kind, `None` is terminal.

use shared::{
    domain::{SurfaceKind, SurfaceState},
    error::BridgeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEffect {
    Create(SurfaceKind),
    Focus(SurfaceKind),
    Destroy(SurfaceKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTransition {
    pub from: SurfaceState,
    pub to: SurfaceState,
    pub effect: Option<SurfaceEffect>,
}

impl SurfaceTransition {
    const fn unchanged(state: SurfaceState) -> Self {
        Self {
            from: state,
            to: state,
            effect: None,
        }
    }

    const fn moving(from: SurfaceState, to: SurfaceState, effect: SurfaceEffect) -> Self {
        Self {
            from,
            to,
            effect: Some(effect),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.effect.is_none()
    }

    /// True only for the transition that closes the last surface.
    pub fn reached_empty(&self) -> bool {
        self.to.is_empty() && !self.from.is_empty()
    }
}

/// Window-system side of the lifecycle. Creation may fail; focus and destroy may not.
pub trait SurfaceHost: Send + Sync {
    fn create(&self, kind: SurfaceKind) -> anyhow::Result<()>;
    fn focus(&self, kind: SurfaceKind);
    fn destroy(&self, kind: SurfaceKind);
}

pub struct HeadlessSurfaceHost;

impl SurfaceHost for HeadlessSurfaceHost {
    fn create(&self, _kind: SurfaceKind) -> anyhow::Result<()> {
        Ok(())
    }

    fn focus(&self, _kind: SurfaceKind) {}

    fn destroy(&self, _kind: SurfaceKind) {}
}

/// The planning methods never mutate; [`SurfaceLifecycle::commit`] applies a planned
/// transition once its side effect has succeeded.
#[derive(Debug, Default)]
pub struct SurfaceLifecycle {
    state: SurfaceState,
}

impl SurfaceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn open_dashboard(&self) -> Result<SurfaceTransition, BridgeError> {
        let from = self.state;
        match from {
            SurfaceState::LauncherOnly => Ok(SurfaceTransition::moving(
                from,
                SurfaceState::Both,
                SurfaceEffect::Create(SurfaceKind::Dashboard),
            )),
            SurfaceState::DashboardOnly | SurfaceState::Both => Ok(SurfaceTransition {
                from,
                to: from,
                effect: Some(SurfaceEffect::Focus(SurfaceKind::Dashboard)),
            }),
            SurfaceState::None => Err(BridgeError::SurfaceUnavailable(
                "no live surface; reactivate the launcher first".to_string(),
            )),
        }
    }

    pub fn close_launcher(&self) -> SurfaceTransition {
        let from = self.state;
        let destroy = SurfaceEffect::Destroy(SurfaceKind::Launcher);
        match from {
            SurfaceState::Both => SurfaceTransition::moving(from, SurfaceState::DashboardOnly, destroy),
            SurfaceState::LauncherOnly => SurfaceTransition::moving(from, SurfaceState::None, destroy),
            SurfaceState::DashboardOnly | SurfaceState::None => SurfaceTransition::unchanged(from),
        }
    }

    pub fn close_dashboard(&self) -> SurfaceTransition {
        let from = self.state;
        let destroy = SurfaceEffect::Destroy(SurfaceKind::Dashboard);
        match from {
            SurfaceState::Both => SurfaceTransition::moving(from, SurfaceState::LauncherOnly, destroy),
            SurfaceState::DashboardOnly => SurfaceTransition::moving(from, SurfaceState::None, destroy),
            SurfaceState::LauncherOnly | SurfaceState::None => SurfaceTransition::unchanged(from),
        }
    }

    pub fn reactivate(&self) -> SurfaceTransition {
        let from = self.state;
        match from {
            SurfaceState::None => SurfaceTransition::moving(
                from,
                SurfaceState::LauncherOnly,
                SurfaceEffect::Create(SurfaceKind::Launcher),
            ),
            _ => SurfaceTransition::unchanged(from),
        }
    }

    pub fn commit(&mut self, transition: &SurfaceTransition) {
        debug_assert_eq!(transition.from, self.state, "stale surface transition");
        self.state = transition.to;
    }
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
