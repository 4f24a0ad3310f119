//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! A client asks for a course to be generated and receives one message per
//! finished unit while the run is in progress.

use crate::web::{
    course_task::generation_process,
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // Every outgoing message goes through one channel; a single task owns the sink.
    let (sender, mut receiver) = socket.split();
    let (events, outgoing) = mpsc::unbounded_channel();
    let forward_task = tokio::spawn(forward_events(outgoing, sender));

    let mut generation_task: Option<JoinHandle<()>> = None;

    // --- Main Message Loop ---
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_text_message(text.as_str(), &app_state, &events, &mut generation_task);
            }
            Ok(Message::Close(_)) => {
                info!("Client sent close message.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // --- Cleanup ---
    // A run in progress keeps going so its document is still stored; only
    // the socket side is torn down.
    drop(events);
    forward_task.abort();
    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    events: &UnboundedSender<ServerMessage>,
    generation_task: &mut Option<JoinHandle<()>>,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let _ = events.send(ServerMessage::Error {
                message: format!("Unrecognised message: {}", e),
            });
            return;
        }
    };

    match client_msg {
        ClientMessage::Generate { course_id } => {
            if generation_task.as_ref().is_some_and(|task| !task.is_finished()) {
                warn!(course_id = %course_id, "Generate received while a run is in progress");
                let _ = events.send(ServerMessage::Error {
                    message: "A course is already being generated on this connection.".to_string(),
                });
                return;
            }

            info!(course_id = %course_id, "Generate message received. Starting generation task.");
            let app_state = app_state.clone();
            let events = events.clone();
            *generation_task = Some(tokio::spawn(async move {
                if let Err(e) = generation_process(app_state, course_id, events.clone()).await {
                    error!(course_id = %course_id, "Generation process failed: {}", e);
                    let _ = events.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }));
        }
    }
}

/// Serialises queued server messages onto the socket until the queue closes
/// or the client goes away.
async fn forward_events(
    mut outgoing: UnboundedReceiver<ServerMessage>,
    mut sender: SplitSink<WebSocket, Message>,
) {
    while let Some(message) = outgoing.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            info!("Client disconnected; no longer forwarding messages.");
            break;
        }
    }
}
