use std::time::Duration;

use control_core::{CommandBridge, Orchestrator, RelayEvent, Settings};
use futures::StreamExt;
use shared::domain::{ReadinessVector, RelayState};
use tokio::{net::TcpListener, time::timeout};

async fn spawn_miner() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let app = miner_server::build_router(miner_server::AppState::new(Duration::from_millis(25)));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("127.0.0.1:{}", addr.port())
}

fn settings_for(addr: &str) -> Settings {
    Settings {
        backend_url: format!("http://{addr}"),
        relay_url: format!("ws://{addr}/ws"),
        job_timeout: Some(Duration::from_secs(30)),
        ..Settings::default()
    }
}

#[tokio::test]
async fn job_and_stats_round_trip_through_bundled_backend() {
    let addr = spawn_miner().await;
    let orchestrator = Orchestrator::new(settings_for(&addr));

    assert_eq!(orchestrator.check_status().await, ReadinessVector::uniform(true));

    let result = orchestrator.start_job(8).await.expect("job");
    assert_eq!(result.hash.len(), 64);
    assert!(result.hash.starts_with("00"), "hash {}", result.hash);
    assert_eq!(result.iterations, result.nonce + 1);

    let stats = orchestrator.fetch_stats().await.expect("stats");
    assert_eq!(stats.current_difficulty, 8);
    assert_eq!(stats.total_hashes, result.iterations);
    assert!(!stats.is_mining);

    let ack = orchestrator.stop_job().await.expect("stop");
    assert_eq!(ack["status"], "stopped");
}

#[tokio::test]
async fn relay_streams_backend_stats_until_disconnect() {
    let addr = spawn_miner().await;
    let orchestrator = Orchestrator::new(settings_for(&addr));

    let mut events = orchestrator.connect_relay(None).await.expect("connect");
    assert_eq!(
        events.next().await,
        Some(RelayEvent::StateChanged(RelayState::Connecting))
    );
    assert_eq!(
        events.next().await,
        Some(RelayEvent::StateChanged(RelayState::Connected))
    );

    for _ in 0..3 {
        let event = timeout(Duration::from_secs(5), events.next())
            .await
            .expect("stats in time");
        assert!(
            matches!(event, Some(RelayEvent::StatsReceived(_))),
            "unexpected event {event:?}"
        );
    }

    orchestrator.disconnect_relay().await.expect("disconnect");
    let rest: Vec<RelayEvent> = timeout(Duration::from_secs(5), events.collect())
        .await
        .expect("stream ends");
    assert_eq!(
        rest.last(),
        Some(&RelayEvent::StateChanged(RelayState::Disconnected))
    );
    assert!(rest[..rest.len() - 1]
        .iter()
        .all(|event| matches!(event, RelayEvent::StatsReceived(_))));
}
