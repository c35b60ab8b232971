use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::models::{ConnectedMessage, ReceivedMessage, SendMessage};
use crate::state::AppState;
use crate::websocket::msg_ping_handler::handle_ping_message;
use crate::websocket::msg_relay_handler::{handle_cursor_move_message, handle_file_change_message};
use crate::websocket::msg_room_handler::{handle_join_message, handle_leave_message};
use crate::ws::BroadcastRelay;

/// WebSocket handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

/// Unregisters the connection however the session ends
struct ConnectionGuard {
    relay: BroadcastRelay,
    connection_id: String,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.relay.disconnect(&self.connection_id);
    }
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, relay: BroadcastRelay) {
    let (connection_id, mut outbound) = relay.connect();
    let _guard = ConnectionGuard {
        relay: relay.clone(),
        connection_id: connection_id.clone(),
    };
    info!("WebSocket connection established with connection_id: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    relay.send_to(
        &connection_id,
        SendMessage::Connected(ConnectedMessage {
            connection_id: connection_id.clone(),
        }),
    );

    // Drain this connection's outbound channel into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Listen to the websocket for incoming messages
    let recv_relay = relay.clone();
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => handle_text_message(&text, &recv_id, &recv_relay),
                Ok(Message::Close(_)) => break,
                // Pings are answered by axum, binary frames are not part of the protocol
                Ok(_) => continue,
                Err(e) => {
                    warn!("WebSocket error on {}: {}", recv_id, e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    info!("WebSocket connection {} terminated", connection_id);
}

/// Parse one text frame and dispatch it. Malformed frames are logged and dropped.
pub fn handle_text_message(text: &str, connection_id: &str, relay: &BroadcastRelay) {
    let msg: ReceivedMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            error!("Failed to parse message from {}: {}", connection_id, e);
            return;
        }
    };
    debug!("Received message from {}: {:?}", connection_id, msg);

    match msg {
        ReceivedMessage::JoinRoom(room) => handle_join_message(&room, connection_id, relay),
        ReceivedMessage::LeaveRoom(room) => handle_leave_message(&room, connection_id, relay),
        ReceivedMessage::FileChange(event) => handle_file_change_message(event, connection_id, relay),
        ReceivedMessage::CursorMove(event) => handle_cursor_move_message(event, connection_id, relay),
        ReceivedMessage::Ping => handle_ping_message(connection_id, relay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_frames_drive_room_membership_and_relay() {
        let relay = BroadcastRelay::new();
        let (a, mut rx_a) = relay.connect();
        let (b, mut rx_b) = relay.connect();
        let (c, mut rx_c) = relay.connect();

        handle_text_message(r#"{"type":"join_room","roomId":"r1"}"#, &a, &relay);
        handle_text_message(r#"{"type":"join_room","roomId":"r1"}"#, &b, &relay);
        handle_text_message(r#"{"type":"join_room","roomId":"r2"}"#, &c, &relay);

        let change = json!({
            "type": "file_change",
            "roomId": "r1",
            "filePath": "/a.ts",
            "content": "const a = 2;",
            "cursorPosition": {"line": 1, "col": 12},
            "timestamp": 1700000000000i64
        });
        handle_text_message(&change.to_string(), &a, &relay);

        let SendMessage::FileChange(event) = rx_b.try_recv().unwrap() else {
            panic!("expected file_change");
        };
        assert_eq!(event.user_id, Some(json!(a)));
        assert_eq!(event.content, Some(json!("const a = 2;")));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());

        handle_text_message(r#"{"type":"leave_room","roomId":"r1"}"#, &b, &relay);
        handle_text_message(&change.to_string(), &a, &relay);
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn payload_fields_of_any_json_type_are_relayed() {
        let relay = BroadcastRelay::new();
        let (a, _rx_a) = relay.connect();
        let (b, mut rx_b) = relay.connect();
        handle_text_message(r#"{"type":"join_room","roomId":"r1"}"#, &a, &relay);
        handle_text_message(r#"{"type":"join_room","roomId":"r1"}"#, &b, &relay);

        let frames = [
            json!({"type": "file_change", "roomId": "r1", "content": "x", "timestamp": 1700000000000.5}),
            json!({"type": "file_change", "roomId": "r1", "content": {"ops": [1]}, "filePath": 7}),
            json!({"type": "cursor_move", "roomId": "r1", "timestamp": "2024-01-01T00:00:00Z"}),
        ];
        for frame in &frames {
            handle_text_message(&frame.to_string(), &a, &relay);
        }

        let SendMessage::FileChange(first) = rx_b.try_recv().unwrap() else {
            panic!("expected file_change");
        };
        assert_eq!(first.timestamp, Some(json!(1700000000000.5)));
        assert_eq!(first.user_id, Some(json!(a)));

        let SendMessage::FileChange(second) = rx_b.try_recv().unwrap() else {
            panic!("expected file_change");
        };
        assert_eq!(second.content, Some(json!({"ops": [1]})));
        assert_eq!(second.file_path, Some(json!(7)));

        let SendMessage::CursorMove(third) = rx_b.try_recv().unwrap() else {
            panic!("expected cursor_move");
        };
        assert_eq!(third.timestamp, Some(json!("2024-01-01T00:00:00Z")));
        assert_eq!(third.user_id, Some(json!(a)));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn malformed_frames_are_ignored() {
        let relay = BroadcastRelay::new();
        let (a, mut rx_a) = relay.connect();
        handle_text_message("not json", &a, &relay);
        handle_text_message(r#"{"type":"file_change"}"#, &a, &relay);
        assert!(rx_a.try_recv().is_err());
        assert!(relay.registry().rooms_of(&a).is_empty());
    }

    #[test]
    fn ping_is_answered_on_the_same_connection() {
        let relay = BroadcastRelay::new();
        let (a, mut rx_a) = relay.connect();
        let (_b, mut rx_b) = relay.connect();
        handle_text_message(r#"{"type":"ping"}"#, &a, &relay);
        assert!(matches!(rx_a.try_recv().unwrap(), SendMessage::Pong(_)));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn dropping_the_guard_unregisters() {
        let relay = BroadcastRelay::new();
        let (a, _rx) = relay.connect();
        relay.join_room(&a, "r1");
        {
            let _guard = ConnectionGuard {
                relay: relay.clone(),
                connection_id: a.clone(),
            };
        }
        assert!(relay.registry().members_of("r1").is_empty());
        assert_eq!(relay.registry().connection_count(), 0);
    }
}
