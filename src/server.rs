use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::sync::{broadcast::error::RecvError, watch};
use tracing::{debug, info, warn};

use crate::render::{Board, BoardHub};

// ---------- Routes ----------

pub fn router(hub: Arc<BoardHub>) -> Router {
    Router::new()
        .route("/board", get(latest_board))
        .route("/ws", get(board_stream))
        .route("/health", get(health))
        .with_state(hub)
}

async fn health() -> &'static str {
    "ok"
}

async fn latest_board(
    State(hub): State<Arc<BoardHub>>,
) -> Result<Json<Board>, (StatusCode, Json<serde_json::Value>)> {
    match hub.latest() {
        Some(board) => Ok(Json(board.as_ref().clone())),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "no board painted yet" })),
        )),
    }
}

async fn board_stream(ws: WebSocketUpgrade, State(hub): State<Arc<BoardHub>>) -> Response {
    ws.on_upgrade(move |socket| push_boards(socket, hub))
}

// ---------- WebSocket push ----------

type WsSender = SplitSink<WebSocket, Message>;

async fn send_board(sender: &mut WsSender, board: &Board) -> Result<(), axum::Error> {
    match serde_json::to_string(board) {
        Ok(text) => sender.send(Message::Text(text)).await,
        Err(e) => {
            warn!(error = %e, "failed to encode board");
            Ok(())
        }
    }
}

async fn push_boards(socket: WebSocket, hub: Arc<BoardHub>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = hub.subscribe();
    debug!("ws client connected");

    if let Some(board) = hub.latest() {
        if send_board(&mut sender, &board).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            pushed = rx.recv() => match pushed {
                Ok(board) => {
                    if send_board(&mut sender, &board).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "ws client lagging; dropped boards");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("ws client disconnected");
}

/// Bind the board listener. Done before polling starts so a bad address is
/// fatal instead of leaving the tracker running with no HTTP surface.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind board server at {addr}"))?;
    info!(addr = %listener.local_addr().unwrap_or(addr), "board server listening");
    Ok(listener)
}

/// Serve the board until `shutdown` flips to `true`.
pub async fn serve(
    listener: TcpListener,
    hub: Arc<BoardHub>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(hub))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("board server failed")?;
    Ok(())
}
