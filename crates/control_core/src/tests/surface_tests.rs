use super::*;

fn lifecycle_in(state: SurfaceState) -> SurfaceLifecycle {
    SurfaceLifecycle { state }
}

fn step(
    lifecycle: &mut SurfaceLifecycle,
    plan: impl FnOnce(&SurfaceLifecycle) -> SurfaceTransition,
) -> SurfaceTransition {
    let transition = plan(&*lifecycle);
    lifecycle.commit(&transition);
    transition
}

#[test]
fn starts_with_launcher_only() {
    assert_eq!(SurfaceLifecycle::new().state(), SurfaceState::LauncherOnly);
}

#[test]
fn launch_flow_ends_with_dashboard_only() {
    let mut lifecycle = SurfaceLifecycle::new();

    let open = lifecycle.open_dashboard().expect("open");
    assert_eq!(open.effect, Some(SurfaceEffect::Create(SurfaceKind::Dashboard)));
    lifecycle.commit(&open);
    assert_eq!(lifecycle.state(), SurfaceState::Both);

    let close = step(&mut lifecycle, SurfaceLifecycle::close_launcher);
    assert_eq!(close.effect, Some(SurfaceEffect::Destroy(SurfaceKind::Launcher)));
    assert_eq!(lifecycle.state(), SurfaceState::DashboardOnly);
    assert!(!close.reached_empty());
}

#[test]
fn open_dashboard_focuses_existing_dashboard() {
    for state in [SurfaceState::DashboardOnly, SurfaceState::Both] {
        let lifecycle = lifecycle_in(state);
        let transition = lifecycle.open_dashboard().expect("focus");
        assert_eq!(transition.to, state);
        assert_eq!(
            transition.effect,
            Some(SurfaceEffect::Focus(SurfaceKind::Dashboard))
        );
    }
}

#[test]
fn open_dashboard_after_last_surface_closed_is_unavailable() {
    let err = lifecycle_in(SurfaceState::None)
        .open_dashboard()
        .expect_err("must fail");
    assert!(matches!(err, BridgeError::SurfaceUnavailable(_)));
}

#[test]
fn closing_last_surface_reaches_none() {
    let mut launcher_only = SurfaceLifecycle::new();
    let transition = step(&mut launcher_only, SurfaceLifecycle::close_launcher);
    assert!(transition.reached_empty());
    assert_eq!(launcher_only.state(), SurfaceState::None);

    let mut dashboard_only = lifecycle_in(SurfaceState::DashboardOnly);
    let transition = step(&mut dashboard_only, SurfaceLifecycle::close_dashboard);
    assert!(transition.reached_empty());
}

#[test]
fn dashboard_close_returns_to_launcher_when_both_open() {
    let mut lifecycle = lifecycle_in(SurfaceState::Both);
    let transition = step(&mut lifecycle, SurfaceLifecycle::close_dashboard);
    assert_eq!(transition.to, SurfaceState::LauncherOnly);
    assert!(!transition.reached_empty());
}

#[test]
fn close_past_none_is_idempotent() {
    let mut lifecycle = lifecycle_in(SurfaceState::None);
    for _ in 0..3 {
        let transition = step(&mut lifecycle, SurfaceLifecycle::close_launcher);
        assert!(transition.is_noop());
        assert!(!transition.reached_empty());
        let transition = step(&mut lifecycle, SurfaceLifecycle::close_dashboard);
        assert!(transition.is_noop());
    }
    assert_eq!(lifecycle.state(), SurfaceState::None);
}

#[test]
fn reactivate_only_recreates_launcher_from_none() {
    let mut lifecycle = lifecycle_in(SurfaceState::None);
    let transition = step(&mut lifecycle, SurfaceLifecycle::reactivate);
    assert_eq!(transition.effect, Some(SurfaceEffect::Create(SurfaceKind::Launcher)));
    assert_eq!(lifecycle.state(), SurfaceState::LauncherOnly);

    assert!(lifecycle.reactivate().is_noop());
}
