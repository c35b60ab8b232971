use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub room_id: String,
}

/// Content edit made by a client, relayed to the other members of its room.
///
/// Only `roomId` is interpreted by the server. Every other field is kept as
/// raw JSON so whatever the client sent reaches the room unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    /// Connection id of the sender, overwritten by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    /// Any other client fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cursor or selection movement, relayed like [`EditEvent`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorEvent {
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notification that a file was saved or deleted through the HTTP API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileNotice {
    pub file_path: String,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReceivedMessage {
    JoinRoom(RoomMessage),
    LeaveRoom(RoomMessage),
    FileChange(EditEvent),
    CursorMove(CursorEvent),
    Ping,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SendMessage {
    Connected(ConnectedMessage),
    FileChange(EditEvent),
    CursorMove(CursorEvent),
    FileSaved(FileNotice),
    FileDeleted(FileNotice),
    Pong(PongMessage),
}

impl SendMessage {
    /// Mark a relayed room event with the connection that sent it.
    /// Other messages are returned unchanged.
    pub fn stamped(self, sender_id: &str) -> Self {
        match self {
            SendMessage::FileChange(mut event) => {
                event.user_id = Some(Value::String(sender_id.to_string()));
                SendMessage::FileChange(event)
            }
            SendMessage::CursorMove(mut event) => {
                event.user_id = Some(Value::String(sender_id.to_string()));
                SendMessage::CursorMove(event)
            }
            other => other,
        }
    }
}
