//! WebSocket routes — the single client surface.
//!
//! `/message` carries the conversation: inbound text frames are user
//! messages (or the stop control frame), outbound frames are the live
//! notification stream. `/stop` exists so a cancel request can arrive while
//! a turn is still being processed on `/message`.

use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use ferrochat_agent::ChatEngine;
use ferrochat_core::interrupt::InterruptSignal;
use ferrochat_core::message::Conversation;
use ferrochat_core::notify::NotificationBus;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Control frame that raises the interrupt signal from the message socket.
pub const STOP_FRAME: &str = "@#STOP#@";

/// Shared application state: one conversation per process lifetime.
pub struct AppState {
    pub engine: ChatEngine,
    pub conversation: Mutex<Conversation>,
    pub signal: Arc<InterruptSignal>,
    pub bus: Arc<NotificationBus>,
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/message", get(message_handler))
        .route("/stop", get(stop_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn message_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_message_socket(socket, state))
}

async fn stop_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stop_socket(socket, state))
}

async fn handle_message_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Message client connected");
    let (mut sender, mut receiver) = socket.split();

    // Forward notifications to the client as they are published.
    let mut rx = state.bus.subscribe();
    let forward = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let Ok(json) = serde_json::to_string(&notification) else {
                        continue;
                    };
                    if sender.send(WsMessage::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // User messages are processed one at a time; the conversation has a
    // single writer. A stop request that must land mid-turn goes through
    // the /stop socket instead.
    while let Some(Ok(frame)) = receiver.next().await {
        match frame {
            WsMessage::Text(text) => {
                let text = text.to_string();
                if text == STOP_FRAME {
                    state.signal.raise();
                    continue;
                }

                let mut conversation = state.conversation.lock().await;
                if let Err(e) = state.engine.process_turn(&mut conversation, &text).await {
                    error!(error = %e, "Turn failed");
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    forward.abort();
    info!("Message client disconnected");
}

async fn handle_stop_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Stop client connected");
    let (_sender, mut receiver) = socket.split();

    // Any inbound frame is a stop request.
    while let Some(Ok(frame)) = receiver.next().await {
        match frame {
            WsMessage::Close(_) => break,
            _ => {
                info!("Interrupt requested");
                state.signal.raise();
            }
        }
    }

    info!("Stop client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrochat_core::tool::ToolRegistry;
    use ferrochat_provider::OpenAiProvider;
    use ferrochat_transcript::NoopTranscriptStore;

    fn test_state() -> Arc<AppState> {
        let bus = Arc::new(NotificationBus::default());
        let signal = Arc::new(InterruptSignal::new());
        let engine = ChatEngine::new(
            Arc::new(OpenAiProvider::new("http://localhost:1", "test-key", "test-model")),
            Arc::new(ToolRegistry::new()),
            Arc::clone(&bus),
            Arc::clone(&signal),
            Arc::new(NoopTranscriptStore),
        );
        Arc::new(AppState {
            engine,
            conversation: Mutex::new(Conversation::new()),
            signal,
            bus,
        })
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let _router = build_router(test_state());
    }

    #[test]
    fn stop_frame_matches_the_wire_protocol() {
        assert_eq!(STOP_FRAME, "@#STOP#@");
    }
}
