//! Backend commands queued from console surfaces to the backend worker.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    CheckStatus,
    /// Open the dashboard, then close the launcher only if that worked.
    Launch,
    OpenDashboard,
    CloseLauncher,
    CloseDashboard,
    Reactivate,
    ConnectRelay {
        address: Option<String>,
    },
    DisconnectRelay,
    StartJob {
        difficulty: i64,
    },
    StopJob,
    FetchStats,
    Terminate,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckStatus => "check_status",
            Self::Launch => "launch",
            Self::OpenDashboard => "open_dashboard",
            Self::CloseLauncher => "close_launcher",
            Self::CloseDashboard => "close_dashboard",
            Self::Reactivate => "reactivate",
            Self::ConnectRelay { .. } => "connect_relay",
            Self::DisconnectRelay => "disconnect_relay",
            Self::StartJob { .. } => "start_job",
            Self::StopJob => "stop_job",
            Self::FetchStats => "fetch_stats",
            Self::Terminate => "terminate",
        }
    }
}
