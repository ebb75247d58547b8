//! Wire-level messages for the realtime socket.

use serde::{Deserialize, Serialize};

/// Frames a client may send.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

/// Frames the server sends.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong,
    Error { message: String },
}

impl ServerMessage {
    pub fn unsupported() -> Self {
        Self::Error {
            message: "unsupported message".to_owned(),
        }
    }
}

/// Reply to one text frame.
pub fn reply_to(text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => ServerMessage::Pong,
        Err(_) => ServerMessage::unsupported(),
    }
}
