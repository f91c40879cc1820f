use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::{Html, IntoResponse},
    routing::get,
};
use follow::{FollowController, Skill, Status};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

/// State shared across HTTP handlers and WebSocket tasks.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FollowController>,
    pub frames: broadcast::Sender<String>,
    pub logs: broadcast::Sender<String>,
    pub connections: Arc<AtomicUsize>,
    commands: mpsc::UnboundedSender<String>,
}

impl AppState {
    /// Must be called within a Tokio runtime: spawns the command dispatcher.
    pub fn new(
        controller: Arc<FollowController>,
        frames: broadcast::Sender<String>,
        logs: broadcast::Sender<String>,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_commands(controller.clone(), rx));
        Self {
            controller,
            frames,
            logs,
            connections: Arc::new(AtomicUsize::new(0)),
            commands,
        }
    }

    /// Queue a command token behind every token received before it.
    pub fn command(&self, token: impl Into<String>) {
        if self.commands.send(token.into()).is_err() {
            error!("command dispatcher gone");
        }
    }
}

/// Hands tokens to the skill one at a time, in arrival order.
async fn dispatch_commands(
    controller: Arc<FollowController>,
    mut tokens: mpsc::UnboundedReceiver<String>,
) {
    while let Some(token) = tokens.recv().await {
        controller.on_recv_string(&token).await;
    }
    debug!("command dispatcher stopped");
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let status = state.controller.status();
    Html(format!(
        "Hexapod follow skill is running ({:?}). Connect your remote to /ws",
        status.state
    ))
}

pub async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(state.controller.status())
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("remote websocket upgrade initiated");
    ws.on_upgrade(move |socket| async move { handle_socket(socket, state).await })
}

pub async fn log_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move { handle_log_socket(socket, state).await })
}

/// Remote protocol: inbound text frames are command tokens, outbound text
/// frames are base64 JPEG images.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("remote connected");
    state.connections.fetch_add(1, Ordering::SeqCst);
    let mut frames = state.frames.subscribe();
    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Ok(data) => {
                        if socket.send(WsMessage::Text(data.into())).await.is_err() {
                            error!("failed sending frame");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "remote lagging");
                        continue;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => state.command(text.as_str()),
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%e, "remote socket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
    if state.connections.fetch_sub(1, Ordering::SeqCst) == 1 {
        info!("last remote disconnected, stopping");
        state.command("stop");
    }
    info!("remote disconnected");
}

async fn handle_log_socket(mut socket: WebSocket, state: AppState) {
    let mut logs = state.logs.subscribe();
    loop {
        match logs.recv().await {
            Ok(line) => {
                if socket.send(WsMessage::Text(line.into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/ws", get(ws_handler))
        .route("/log", get(log_ws_handler))
        .with_state(state)
}
