//! `watch`: serves the assembled spec over HTTP and pushes
//! `{"event":"documentation-updated","path":"..."}` over a WebSocket
//! whenever a watched source file changes.

use std::sync::{Arc, Mutex};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use notify::{RecursiveMode, Watcher};
use tokio::sync::broadcast;

use crate::commands::generate::build_document_for_export;
use crate::config::ProjectConfig;

struct WatchState {
    config: ProjectConfig,
    document: Mutex<serde_json::Value>,
    updates: broadcast::Sender<String>,
}

/// Runs the watch daemon until interrupted. Regenerates the spec on every
/// filesystem event under `config.source_dir`/`config.routes_file` and
/// broadcasts an update notification to connected WebSocket subscribers.
pub async fn run(config: ProjectConfig) -> anyhow::Result<()> {
    let initial = build_document_for_export(&config)?;
    let (tx, _rx) = broadcast::channel(64);
    let state = Arc::new(WatchState { config: config.clone(), document: Mutex::new(initial), updates: tx });

    let watcher_state = state.clone();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if event.is_ok() {
            regenerate_and_notify(&watcher_state);
        }
    })?;
    watcher.watch(&state.config.source_dir, RecursiveMode::Recursive)?;
    if state.config.routes_file.exists() {
        watcher.watch(&state.config.routes_file, RecursiveMode::NonRecursive)?;
    }

    let app = Router::new()
        .route("/openapi.json", get(serve_spec))
        .route("/ws", get(serve_ws))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    eprintln!("watching {} — serving on http://127.0.0.1:{}/openapi.json", config.source_dir.display(), config.port);
    axum::serve(listener, app).await?;

    // Keep the watcher alive for the duration of the server.
    drop(watcher);
    Ok(())
}

fn regenerate_and_notify(state: &Arc<WatchState>) {
    match build_document_for_export(&state.config) {
        Ok(fresh) => {
            *state.document.lock().unwrap() = fresh;
            let event = serde_json::json!({
                "event": "documentation-updated",
                "path": state.config.source_dir.to_string_lossy(),
            });
            let _ = state.updates.send(event.to_string());
        }
        Err(error) => tracing::warn!(%error, "failed to regenerate spec after file change"),
    }
}

async fn serve_spec(State(state): State<Arc<WatchState>>) -> Response {
    let document = state.document.lock().unwrap().clone();
    let mut response = (StatusCode::OK, axum::Json(document)).into_response();
    response
        .headers_mut()
        .insert("access-control-allow-origin", HeaderValue::from_static("*"));
    response
}

async fn serve_ws(ws: WebSocketUpgrade, State(state): State<Arc<WatchState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<WatchState>) {
    let mut updates = state.updates.subscribe();
    while let Ok(message) = updates.recv().await {
        if socket.send(Message::Text(message.into())).await.is_err() {
            break;
        }
    }
}
