use serde::{Deserialize, Serialize};

/// Liveness summary used to gate launcher affordances.
///
/// The backend exposes one combined health signal, so all three flags always move
/// together; see [`ReadinessVector::uniform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadinessVector {
    pub engine_up: bool,
    pub api_up: bool,
    pub relay_up: bool,
}

impl ReadinessVector {
    pub const fn uniform(up: bool) -> Self {
        Self {
            engine_up: up,
            api_up: up,
            relay_up: up,
        }
    }

    pub const fn all_up(&self) -> bool {
        self.engine_up && self.api_up && self.relay_up
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RelayState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl RelayState {
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Disconnected and Failed both end a connection's event stream.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Failed(_) => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Launcher,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    #[default]
    LauncherOnly,
    DashboardOnly,
    Both,
    None,
}

impl SurfaceState {
    pub const fn has(self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Launcher => matches!(self, Self::LauncherOnly | Self::Both),
            SurfaceKind::Dashboard => matches!(self, Self::DashboardOnly | Self::Both),
        }
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
    Terminated,
    LastSurfaceClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_readiness_keeps_flags_equal() {
        for up in [true, false] {
            let readiness = ReadinessVector::uniform(up);
            assert_eq!(readiness.engine_up, readiness.api_up);
            assert_eq!(readiness.api_up, readiness.relay_up);
            assert_eq!(readiness.all_up(), up);
        }
    }

    #[test]
    fn surface_state_reports_live_kinds() {
        assert!(SurfaceState::Both.has(SurfaceKind::Launcher));
        assert!(SurfaceState::Both.has(SurfaceKind::Dashboard));
        assert!(!SurfaceState::LauncherOnly.has(SurfaceKind::Dashboard));
        assert!(!SurfaceState::DashboardOnly.has(SurfaceKind::Launcher));
        assert!(SurfaceState::None.is_empty());
    }

    #[test]
    fn relay_state_serializes_failure_reason() {
        let json = serde_json::to_value(RelayState::Failed("refused".to_string())).expect("json");
        assert_eq!(json, serde_json::json!({ "state": "failed", "reason": "refused" }));
    }
}
