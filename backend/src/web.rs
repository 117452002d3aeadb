use crate::state::AppState;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::{header, HeaderMap, StatusCode};
use axum::{
    extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use satview_shared::{Command, SUBPROTOCOL};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

/// Public router constructor
pub fn router(state: Arc<AppState>) -> Router {
    // anything that isn't the socket goes to the static files
    let static_files = Router::new()
        .fallback_service(ServeDir::new(&state.static_dir))
        .layer(CompressionLayer::new());

    Router::new()
        .route("/", get(root))
        .with_state(state)
        .merge(static_files)
}

/// `/` is both the page and the socket, matching what the dashboard connects to.
async fn root(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(_) => return serve_index(&state.static_dir).await,
    };

    if !offers_subprotocol(&headers) {
        tracing::warn!("rejecting websocket upgrade without the {SUBPROTOCOL} sub-protocol");
        return (StatusCode::BAD_REQUEST, "unsupported websocket sub-protocol").into_response();
    }

    ws.protocols([SUBPROTOCOL])
        .on_upgrade(move |socket| handle_ws(socket, state))
}

fn offers_subprotocol(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|p| p.trim() == SUBPROTOCOL)
}

async fn serve_index(static_dir: &Path) -> Response {
    let path = static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            (StatusCode::NOT_FOUND, "dashboard not built").into_response()
        }
    }
}

async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let mut frames_rx = state.ws_tx.subscribe();
    let cmd_tx = state.cmd_tx.clone();
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("dashboard connected");

    // Task: server -> client
    let send_task = async move {
        loop {
            match frames_rx.recv().await {
                Ok(msg) => {
                    let text = msg.to_json();
                    if sender
                        .send(Message::Text(Utf8Bytes::from(text)))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "dashboard fell behind the solver");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    // Task: client -> server (commands)
    let recv_task = async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match text.as_str().parse::<Command>() {
                    Ok(cmd) => {
                        if let Err(e) = cmd_tx.send(cmd).await {
                            tracing::error!("failed to forward {cmd} to the solver: {e}");
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("ignoring frame: {e}"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    // Either side ending closes the session
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }
    tracing::info!("dashboard disconnected");
}
