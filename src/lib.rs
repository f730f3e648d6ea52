//! # Huddle
//!
//! HTTP and WebSocket surface for shared coding rooms. Members of a room
//! subscribe to its console; any member can submit a run, and the finished
//! report is broadcast to every console in the room.

mod hub;

pub use hub::{RoomEvent, RoomHub, CODE_OUTPUT_EVENT};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use huddle_exec::{CorrelationKey, ExecutionRequest, ExecutionRouter, ExecutionService, Language};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid language: {0}")]
    InvalidLanguage(String),
    #[error("Execution error: {0}")]
    ExecutionError(#[from] huddle_exec::Error),
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::InvalidLanguage(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::ExecutionError(huddle_exec::Error::UnsupportedLanguage(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::ExecutionError(_) | ServerError::ServerError(_) => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RunRequest {
    pub language: String,
    pub code: String,
    /// Free text, one input value per line
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    service: ExecutionService,
    hub: Arc<RoomHub>,
}

pub fn create_app(router: ExecutionRouter, max_concurrent_runs: usize) -> Router {
    create_app_with_hub(router, max_concurrent_runs, Arc::new(RoomHub::new()))
}

pub fn create_app_with_hub(
    router: ExecutionRouter,
    max_concurrent_runs: usize,
    hub: Arc<RoomHub>,
) -> Router {
    let state = AppState {
        service: ExecutionService::new(router, hub.clone(), max_concurrent_runs),
        hub,
    };

    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(health_check))
        .route("/rooms/{code}/run", post(run))
        .route("/rooms/{code}/console", get(console))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;
    serve(listener, app).await
}

/// Serves `app` on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!("Starting huddle server on {}", addr);
    }
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn run(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RoomEvent>, ServerError> {
    let language: Language = payload
        .language
        .parse()
        .map_err(|_| ServerError::InvalidLanguage(payload.language.clone()))?;

    let request = ExecutionRequest::new(language, payload.code, CorrelationKey::new(room))
        .with_raw_input(payload.input.as_deref().unwrap_or_default());

    let result = state.service.run_and_broadcast(request).await?;
    Ok(Json(RoomEvent::code_output(&result)))
}

async fn console(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let room = CorrelationKey::new(room);
    let reports = state.hub.subscribe(&room).await;
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| async move {
        forward_reports(socket, reports, &room).await;
        hub.prune(&room).await;
    })
}

/// Pushes room reports to one console until either side closes.
/// Consumes the subscription so the room can be pruned afterwards.
async fn forward_reports(
    socket: WebSocket,
    mut reports: broadcast::Receiver<RoomEvent>,
    room: &CorrelationKey,
) {
    let (mut sender, mut receiver) = socket.split();
    debug!("Console joined room {}", room);

    loop {
        tokio::select! {
            report = reports.recv() => match report {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("Failed to encode room event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Console in room {} skipped {} reports", room, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("Console left room {}", room);
}
