//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a grounded chat WebSocket
//! connection. One reply is streamed to completion before the next client
//! message is read.

use crate::web::{
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
use study_assistant_core::chat::ChatSession;
use tracing::{error, info, warn};
use uuid::Uuid;

type WsSender = SplitSink<WebSocket, Message>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!("New chat connection {} established.", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // --- 1. Initialization Phase ---
    let mut session = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => {
            match serde_json::from_str::<ClientMessage>(init_json.as_str()) {
                Ok(ClientMessage::Init { summary_id }) => {
                    info!("Connection {} opening chat for summary {}", connection_id, summary_id);
                    match app_state.study.open_chat(&summary_id).await {
                        Ok(session) => session,
                        Err(e) => {
                            error!("Failed to open chat for summary {}: {:?}", summary_id, e);
                            send_message(&mut sender, &ServerMessage::Error { message: e.to_string() })
                                .await;
                            return;
                        }
                    }
                }
                _ => {
                    error!("First message was not a valid Init message.");
                    let err = ServerMessage::Error {
                        message: "The first message must be an init message.".to_string(),
                    };
                    send_message(&mut sender, &err).await;
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };

    let init_msg = ServerMessage::ChatInitialized {
        summary_id: session.summary_id().to_string(),
    };
    if !send_message(&mut sender, &init_msg).await {
        return;
    }

    // --- 2. Main Message Loop ---
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                if !handle_text_message(text.as_str(), &mut session, &mut sender).await {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket error on connection {}: {}", connection_id, e);
                break;
            }
            None => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    info!(
        "Chat connection {} closed after {} messages.",
        connection_id,
        session.transcript().messages().len()
    );
}

/// Handles one client message. Returns `false` once the client is unreachable.
async fn handle_text_message(text: &str, session: &mut ChatSession, sender: &mut WsSender) -> bool {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SendMessage { message }) => message,
        Ok(ClientMessage::Init { .. }) => {
            warn!("Received subsequent Init message, which is ignored.");
            return true;
        }
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return true;
        }
    };

    let message = message.trim();
    if message.is_empty() {
        warn!("Ignoring empty chat message.");
        return true;
    }

    if !send_message(sender, &ServerMessage::ReplyStarted).await {
        return false;
    }

    let mut fragments = match session.send(message).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Chat request failed: {:?}", e);
            return send_message(sender, &ServerMessage::Error { message: e.to_string() }).await;
        }
    };

    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => {
                session.record_fragment(&text);
                if !send_message(sender, &ServerMessage::ReplyFragment { text }).await {
                    return false;
                }
            }
            Err(e) => {
                error!("Chat reply failed mid-stream: {:?}", e);
                session.fail_reply();
                return send_message(sender, &ServerMessage::Error { message: e.to_string() }).await;
            }
        }
    }

    send_message(sender, &ServerMessage::ReplyEnded).await
}

async fn send_message(sender: &mut WsSender, msg: &ServerMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return false;
        }
    };
    if sender.send(Message::Text(json.into())).await.is_err() {
        warn!("Failed to send message. Client may have disconnected.");
        return false;
    }
    true
}
