//! WebSocket connection handlers.
//!
//! Each accepted socket gets a fresh `ConnectionId`. Inbound frames are
//! processed one at a time in arrival order; when the socket closes the
//! connection is unregistered from the publisher and exactly one disconnect
//! notification is issued.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Password, RoomId, Username},
    infrastructure::dto::websocket::{ClientFrame, RoomRequestDto, SendMessageDto},
    ui::state::AppState,
    usecase::{DisconnectOutcome, OutgoingMessage, RoomRequest},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames published to this connection
/// * `sender` - WebSocket sink to send frames to this client
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    tracing::info!(connection_id = %connection_id, "Client connected");

    let (tx, rx) = mpsc::unbounded_channel();
    state
        .publisher
        .register_client(connection_id.clone(), tx)
        .await;

    let (sender, mut receiver) = socket.split();

    let state_clone = Arc::clone(&state);
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => handle_frame(&state_clone, &connection_id_clone, frame).await,
                    Err(e) => tracing::warn!("Failed to parse frame, dropped: {}", e),
                },
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!(connection_id = %connection_id_clone, "Client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push published frames to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.publisher.unregister_client(&connection_id).await;

    match state.presence.disconnect(&connection_id).await {
        DisconnectOutcome::Left => {
            tracing::info!(connection_id = %connection_id, "Client disconnected and left its room");
        }
        outcome => {
            tracing::debug!(connection_id = %connection_id, ?outcome, "Client disconnected");
        }
    }
}

/// Dispatch a single inbound frame.
async fn handle_frame(state: &AppState, connection_id: &ConnectionId, frame: ClientFrame) {
    match frame {
        ClientFrame::Subscribe { topic } => {
            state.publisher.subscribe(connection_id, topic).await;
        }
        ClientFrame::Unsubscribe { topic } => {
            state.publisher.unsubscribe(connection_id, &topic).await;
        }
        ClientFrame::SendMessage(dto) => {
            let Some(message) = to_outgoing_message(dto) else {
                tracing::debug!("Incomplete chat message, dropped");
                return;
            };
            // 送信者へのエラー通知はしない
            let _ = state.message_router.send_message(message).await;
        }
        ClientFrame::CreateRoom(dto) => {
            let Some(request) = to_room_request(dto) else {
                tracing::debug!("Incomplete create-room request, dropped");
                return;
            };
            // エラーは要求者の ERROR トピックへ通知済み
            let _ = state
                .presence
                .create_room(request, connection_id.clone())
                .await;
        }
        ClientFrame::JoinRoom(dto) => {
            let Some(request) = to_room_request(dto) else {
                tracing::debug!("Incomplete join-room request, dropped");
                return;
            };
            let _ = state
                .presence
                .join_room(request, connection_id.clone())
                .await;
        }
        ClientFrame::LeaveRoom {} => {
            state.presence.leave_room(connection_id).await;
        }
    }
}

/// DTO → Domain Model. Requests without a room id or username are dropped.
fn to_room_request(dto: RoomRequestDto) -> Option<RoomRequest> {
    Some(RoomRequest {
        room_id: RoomId::new(dto.room_id).ok()?,
        password: Password::new(dto.password),
        username: Username::new(dto.username).ok()?,
    })
}

fn to_outgoing_message(dto: SendMessageDto) -> Option<OutgoingMessage> {
    Some(OutgoingMessage {
        room_id: RoomId::new(dto.room_id).ok()?,
        sender: Username::new(dto.sender).ok()?,
        content: dto.content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_request_requires_room_and_username() {
        // テスト項目: room id か username が空のリクエストは破棄される
        // given (前提条件):
        let missing_room = RoomRequestDto {
            room_id: String::new(),
            password: String::new(),
            username: "alice".to_string(),
        };
        let missing_user = RoomRequestDto {
            room_id: "lobby".to_string(),
            password: String::new(),
            username: String::new(),
        };

        // when (操作):
        let a = to_room_request(missing_room);
        let b = to_room_request(missing_user);

        // then (期待する結果):
        assert!(a.is_none());
        assert!(b.is_none());
    }

    #[test]
    fn test_room_request_keeps_empty_password() {
        // テスト項目: 空のパスワードはそのまま保持される
        // given (前提条件):
        let dto = RoomRequestDto {
            room_id: "lobby".to_string(),
            password: String::new(),
            username: "alice".to_string(),
        };

        // when (操作):
        let request = to_room_request(dto).unwrap();

        // then (期待する結果):
        assert!(request.password.is_empty());
        assert_eq!(request.username.as_str(), "alice");
    }

    #[test]
    fn test_outgoing_message_requires_sender() {
        // テスト項目: 送信者のないメッセージは破棄される
        // given (前提条件):
        let dto = SendMessageDto {
            room_id: "lobby".to_string(),
            sender: String::new(),
            content: "hi".to_string(),
        };

        // when (操作):
        let message = to_outgoing_message(dto);

        // then (期待する結果):
        assert!(message.is_none());
    }
}
