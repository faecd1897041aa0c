use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{MineRequest, MineResponse, StatsSnapshot, StopResponse},
};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

pub mod config;
pub mod mining;

use mining::{mine_block, MiningState, BLOCK_HEADER, MAX_DIFFICULTY};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Clone)]
pub struct AppState {
    mining: Arc<MiningState>,
    stats_interval: Duration,
}

impl AppState {
    pub fn new(stats_interval: Duration) -> Self {
        Self {
            mining: Arc::new(MiningState::new()),
            stats_interval,
        }
    }

    pub fn mining(&self) -> &MiningState {
        &self.mining
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/mine", post(start_mining))
        .route("/api/stop", post(stop_mining))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.mining.snapshot())
}

async fn start_mining(
    State(state): State<AppState>,
    Json(req): Json<MineRequest>,
) -> ApiResult<MineResponse> {
    let difficulty = u32::try_from(req.target_difficulty)
        .ok()
        .filter(|bits| *bits <= MAX_DIFFICULTY)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(
                    ErrorCode::Validation,
                    format!("target_difficulty must be between 0 and {MAX_DIFFICULTY}"),
                )),
            )
        })?;

    if !state.mining.try_begin(difficulty) {
        return Err((
            StatusCode::CONFLICT,
            Json(ApiError::new(ErrorCode::Busy, "a mining job is already running")),
        ));
    }

    info!(difficulty, "mining job accepted");
    let mining = Arc::clone(&state.mining);
    let result = tokio::task::spawn_blocking(move || mine_block(BLOCK_HEADER, difficulty, &mining))
        .await
        .map_err(|e| {
            error!(error = %e, "mining task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(ErrorCode::Internal, e.to_string())),
            )
        })?;

    Ok(Json(result))
}

async fn stop_mining(State(state): State<AppState>) -> Json<StopResponse> {
    state.mining.request_stop();
    info!("mining stop requested");
    Json(StopResponse {
        status: "stopped".to_string(),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: AppState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(state.stats_interval);
    let mining = Arc::clone(&state.mining);

    let send_task = tokio::spawn(async move {
        loop {
            ticker.tick().await;
            let text = match serde_json::to_string(&mining.snapshot()) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        if matches!(msg, Message::Close(_)) {
            break;
        }
    }
    debug!("stats relay client left");

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
