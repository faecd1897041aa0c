//! UI/backend events and error modeling for the dashboard controller.

use std::fmt;

use shared::{
    domain::{ReadinessVector, RelayState, ShutdownReason, SurfaceState},
    error::{BridgeError, ErrorCode},
    protocol::{MiningJobResult, StatsSnapshot},
};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Info(String),
    Readiness(ReadinessVector),
    SurfacesChanged(SurfaceState),
    RelayStateChanged(RelayState),
    /// Pushed by the relay; updates the view quietly.
    RelayStats(StatsSnapshot),
    /// Answer to an explicit stats request.
    StatsFetched(StatsSnapshot),
    JobStarted {
        difficulty: i64,
    },
    JobFinished(MiningJobResult),
    JobStopAcknowledged(serde_json::Value),
    Error(UiError),
    Shutdown(ShutdownReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Protocol,
    Backend,
    Busy,
    Surface,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Surface,
    Relay,
    Job,
    Stats,
    General,
}

impl fmt::Display for UiErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BackendStartup => "startup",
            Self::Surface => "window",
            Self::Relay => "relay",
            Self::Job => "mining",
            Self::Stats => "stats",
            Self::General => "general",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_bridge(context: UiErrorContext, err: &BridgeError) -> Self {
        let category = match err.code() {
            ErrorCode::Unreachable | ErrorCode::Timeout | ErrorCode::NotConnected => {
                UiErrorCategory::Transport
            }
            ErrorCode::MalformedResponse => UiErrorCategory::Protocol,
            ErrorCode::Backend => UiErrorCategory::Backend,
            ErrorCode::Busy => UiErrorCategory::Busy,
            ErrorCode::SurfaceUnavailable => UiErrorCategory::Surface,
            ErrorCode::InvalidAddress | ErrorCode::Validation => UiErrorCategory::Validation,
            ErrorCode::Internal => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    /// Best-effort classification for failures that never went through the bridge.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("must be between")
            || lower.contains("invalid")
            || lower.contains("unknown command")
            || lower.contains("missing")
        {
            UiErrorCategory::Validation
        } else if lower.contains("queue is full") || lower.contains("in progress") {
            UiErrorCategory::Busy
        } else if lower.contains("disconnected")
            || lower.contains("connection")
            || lower.contains("timed out")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Worth retrying as-is once the backend or relay settles.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Transport | UiErrorCategory::Busy
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
