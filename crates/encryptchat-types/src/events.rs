use serde::{Deserialize, Serialize};

use crate::api::MessageResponse;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Connection accepted. `server_time` (epoch ms) can be used as the
    /// `since` cursor for a later `Sync`.
    Ready { server_time: i64 },

    /// A message was posted, or replayed by a `Sync`. Text is decoded.
    MessageCreate(MessageResponse),
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Replay stored messages newer than `since` (all of them if `None`),
    /// oldest first. Used to refresh the list after (re)connecting.
    Sync { since: Option<i64> },
}
