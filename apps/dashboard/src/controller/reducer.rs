//! View state for both surfaces and the transitions driven by [`UiEvent`]s.

use std::collections::VecDeque;

use shared::{
    domain::{ReadinessVector, RelayState, ShutdownReason, SurfaceKind, SurfaceState},
    protocol::{MiningJobResult, StatsSnapshot},
};

use crate::controller::events::{UiErrorContext, UiEvent};

const DASHBOARD_LOG_LIMIT: usize = 200;

pub fn format_hash_rate(rate: f64) -> String {
    if rate >= 1_000_000.0 {
        format!("{:.2} MH/s", rate / 1_000_000.0)
    } else if rate >= 1_000.0 {
        format!("{:.2} KH/s", rate / 1_000.0)
    } else {
        format!("{rate:.2} H/s")
    }
}

/// Thousands-grouped decimal, e.g. `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn job_result_log_lines(result: &MiningJobResult) -> [String; 3] {
    [
        format!("Mining completed! Nonce: {}", result.nonce),
        format!("Hash: {}", result.hash),
        format!("Iterations: {}", format_count(result.iterations)),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherView {
    readiness: Option<ReadinessVector>,
}

impl LauncherView {
    pub fn readiness(&self) -> Option<ReadinessVector> {
        self.readiness
    }

    pub fn engine_label(&self) -> &'static str {
        match self.readiness {
            None => "Checking...",
            Some(r) if r.engine_up => "Ready",
            Some(_) => "Not Running",
        }
    }

    pub fn api_label(&self) -> &'static str {
        match self.readiness {
            None => "Checking...",
            Some(r) if r.api_up => "Online",
            Some(_) => "Offline",
        }
    }

    pub fn relay_label(&self) -> &'static str {
        match self.readiness {
            None => "Checking...",
            Some(r) if r.relay_up => "Available",
            Some(_) => "Unavailable",
        }
    }

    /// Launching stays allowed with a dead backend; the label says so.
    pub fn launch_enabled(&self) -> bool {
        true
    }

    pub fn launch_label(&self) -> &'static str {
        match self.readiness {
            Some(r) if r.all_up() => "Launch Dashboard",
            _ => "Launch Dashboard (Limited)",
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Mining engine: {}", self.engine_label()),
            format!("API server: {}", self.api_label()),
            format!("WebSocket: {}", self.relay_label()),
            format!("[{}]", self.launch_label()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    relay: RelayState,
    stats: Option<StatsSnapshot>,
    job_pending: bool,
    log: VecDeque<String>,
}

impl DashboardView {
    pub fn relay(&self) -> &RelayState {
        &self.relay
    }

    pub fn stats(&self) -> Option<&StatsSnapshot> {
        self.stats.as_ref()
    }

    pub fn job_pending(&self) -> bool {
        self.job_pending
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == DASHBOARD_LOG_LIMIT {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    pub fn relay_label(&self) -> String {
        match &self.relay {
            RelayState::Failed(reason) => format!("Failed ({reason})"),
            other => other.label().to_string(),
        }
    }

    pub fn stats_line(&self) -> String {
        match &self.stats {
            None => "No stats yet".to_string(),
            Some(stats) => format!(
                "Hash rate: {} | Total hashes: {} | Difficulty: {} | Mining: {}",
                format_hash_rate(stats.hash_rate),
                format_count(stats.total_hashes),
                stats.current_difficulty,
                if stats.is_mining { "yes" } else { "no" }
            ),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Relay: {}", self.relay_label()),
            self.stats_line(),
        ];
        if self.job_pending {
            lines.push("Job: running".to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppView {
    pub surfaces: SurfaceState,
    pub launcher: LauncherView,
    pub dashboard: DashboardView,
}

impl AppView {
    /// Folds one event into the view and returns the console lines it produces.
    pub fn apply(&mut self, event: UiEvent) -> Vec<String> {
        match event {
            UiEvent::Info(message) => vec![message],
            UiEvent::Readiness(readiness) => {
                self.launcher.readiness = Some(readiness);
                self.launcher.lines()
            }
            UiEvent::SurfacesChanged(surfaces) => {
                self.surfaces = surfaces;
                vec![describe_surfaces(surfaces)]
            }
            UiEvent::RelayStateChanged(state) => {
                self.dashboard.relay = state;
                let line = format!("Relay: {}", self.dashboard.relay_label());
                self.dashboard.push_log(line.clone());
                vec![line]
            }
            UiEvent::RelayStats(stats) => {
                let was_mining = self.dashboard.stats.as_ref().map(|s| s.is_mining);
                let now_mining = stats.is_mining;
                self.dashboard.stats = Some(stats);
                match was_mining {
                    Some(was) if was == now_mining => Vec::new(),
                    _ => vec![self.dashboard.stats_line()],
                }
            }
            UiEvent::StatsFetched(stats) => {
                self.dashboard.stats = Some(stats);
                vec![self.dashboard.stats_line()]
            }
            UiEvent::JobStarted { difficulty } => {
                self.dashboard.job_pending = true;
                let line = format!("Starting mining with difficulty {difficulty}...");
                self.dashboard.push_log(line.clone());
                vec![line]
            }
            UiEvent::JobFinished(result) => {
                self.dashboard.job_pending = false;
                let lines = job_result_log_lines(&result);
                for line in &lines {
                    self.dashboard.push_log(line.clone());
                }
                lines.to_vec()
            }
            UiEvent::JobStopAcknowledged(ack) => {
                let status = ack
                    .get("status")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| ack.to_string());
                let line = format!("Mining stop requested ({status})");
                self.dashboard.push_log(line.clone());
                vec![line]
            }
            UiEvent::Error(err) => {
                if err.context() == UiErrorContext::Job {
                    self.dashboard.job_pending = false;
                }
                let hint = if err.is_retryable() { "; retry shortly" } else { "" };
                let line = format!("Error ({}): {}{hint}", err.context(), err.message());
                self.dashboard.push_log(line.clone());
                vec![line]
            }
            UiEvent::Shutdown(reason) => vec![match reason {
                ShutdownReason::Terminated => "Shutting down".to_string(),
                ShutdownReason::LastSurfaceClosed => {
                    "All windows closed; shutting down".to_string()
                }
            }],
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![describe_surfaces(self.surfaces)];
        if self.surfaces.has(SurfaceKind::Launcher) {
            lines.extend(self.launcher.lines());
        }
        if self.surfaces.has(SurfaceKind::Dashboard) {
            lines.extend(self.dashboard.lines());
        }
        lines
    }
}

fn describe_surfaces(surfaces: SurfaceState) -> String {
    let open = |kind| if surfaces.has(kind) { "open" } else { "closed" };
    format!(
        "Windows: launcher {}, dashboard {}",
        open(SurfaceKind::Launcher),
        open(SurfaceKind::Dashboard)
    )
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
