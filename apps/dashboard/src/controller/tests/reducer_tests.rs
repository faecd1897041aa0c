use super::*;
use crate::controller::events::UiError;
use shared::error::BridgeError;

fn stats(is_mining: bool, total_hashes: u64) -> StatsSnapshot {
    StatsSnapshot {
        hash_rate: 2_500.0,
        total_hashes,
        current_difficulty: 20,
        is_mining,
    }
}

#[test]
fn formats_hash_rates_with_unit_steps() {
    assert_eq!(format_hash_rate(0.0), "0.00 H/s");
    assert_eq!(format_hash_rate(999.0), "999.00 H/s");
    assert_eq!(format_hash_rate(1_500.0), "1.50 KH/s");
    assert_eq!(format_hash_rate(2_345_678.0), "2.35 MH/s");
}

#[test]
fn groups_counts_by_thousands() {
    assert_eq!(format_count(0), "0");
    assert_eq!(format_count(999), "999");
    assert_eq!(format_count(1_000), "1,000");
    assert_eq!(format_count(1_234_567), "1,234,567");
}

#[test]
fn launcher_labels_follow_readiness() {
    let mut launcher = LauncherView::default();
    assert_eq!(launcher.engine_label(), "Checking...");

    launcher.readiness = Some(ReadinessVector::uniform(false));
    assert_eq!(launcher.engine_label(), "Not Running");
    assert_eq!(launcher.api_label(), "Offline");
    assert_eq!(launcher.relay_label(), "Unavailable");
    assert_eq!(launcher.launch_label(), "Launch Dashboard (Limited)");
    assert!(launcher.launch_enabled());

    launcher.readiness = Some(ReadinessVector::uniform(true));
    assert_eq!(launcher.engine_label(), "Ready");
    assert_eq!(launcher.api_label(), "Online");
    assert_eq!(launcher.relay_label(), "Available");
    assert_eq!(launcher.launch_label(), "Launch Dashboard");
}

#[test]
fn job_completion_logs_nonce_hash_iterations_in_order() {
    let mut view = AppView::default();
    view.apply(UiEvent::JobStarted { difficulty: 20 });
    assert!(view.dashboard.job_pending());

    let lines = view.apply(UiEvent::JobFinished(MiningJobResult {
        nonce: 12345,
        hash: "00000abc".to_string(),
        iterations: 12346,
    }));

    assert_eq!(
        lines,
        vec![
            "Mining completed! Nonce: 12345".to_string(),
            "Hash: 00000abc".to_string(),
            "Iterations: 12,346".to_string(),
        ]
    );
    assert!(!view.dashboard.job_pending());
    let log: Vec<&str> = view.dashboard.log().collect();
    assert_eq!(log.len(), 4);
    assert_eq!(log[1], "Mining completed! Nonce: 12345");
}

#[test]
fn job_error_clears_pending_flag() {
    let mut view = AppView::default();
    view.apply(UiEvent::JobStarted { difficulty: 5 });
    let lines = view.apply(UiEvent::Error(UiError::from_bridge(
        UiErrorContext::Job,
        &BridgeError::Timeout,
    )));

    assert!(!view.dashboard.job_pending());
    assert_eq!(lines, vec!["Error (mining): backend call timed out; retry shortly".to_string()]);
}

#[test]
fn relay_stats_only_print_when_mining_flag_flips() {
    let mut view = AppView::default();
    assert_eq!(view.apply(UiEvent::RelayStats(stats(false, 0))).len(), 1);
    assert!(view.apply(UiEvent::RelayStats(stats(false, 0))).is_empty());
    assert_eq!(view.apply(UiEvent::RelayStats(stats(true, 10_000))).len(), 1);
    assert!(view.apply(UiEvent::RelayStats(stats(true, 20_000))).is_empty());
    assert_eq!(view.dashboard.stats().map(|s| s.total_hashes), Some(20_000));
}

#[test]
fn relay_failure_is_shown_with_reason() {
    let mut view = AppView::default();
    let lines = view.apply(UiEvent::RelayStateChanged(RelayState::Failed(
        "connection refused".to_string(),
    )));
    assert_eq!(lines, vec!["Relay: Failed (connection refused)".to_string()]);
}

#[test]
fn dashboard_log_is_bounded() {
    let mut view = AppView::default();
    for i in 0..(DASHBOARD_LOG_LIMIT + 10) {
        view.apply(UiEvent::JobStarted { difficulty: i as i64 });
    }
    let log: Vec<&str> = view.dashboard.log().collect();
    assert_eq!(log.len(), DASHBOARD_LOG_LIMIT);
    assert_eq!(log[0], "Starting mining with difficulty 10...");
}

#[test]
fn view_lines_follow_open_surfaces() {
    let mut view = AppView::default();
    view.apply(UiEvent::Readiness(ReadinessVector::uniform(true)));
    assert!(view.lines().iter().any(|l| l == "[Launch Dashboard]"));

    view.apply(UiEvent::SurfacesChanged(SurfaceState::DashboardOnly));
    let lines = view.lines();
    assert_eq!(lines[0], "Windows: launcher closed, dashboard open");
    assert!(!lines.iter().any(|l| l.starts_with("Mining engine")));
    assert!(lines.iter().any(|l| l == "Relay: Disconnected"));
}
