use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ChatMessage;

// -- Messages --

/// Plaintext as typed by the user. Encoding happens server-side before storage.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub text: String,
    pub author: String,
}

/// A message as shown to readers: text already decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub timestamp: i64,
    pub display_time: String,
}

impl MessageResponse {
    pub fn from_message(id: Uuid, msg: &ChatMessage) -> Self {
        Self {
            id,
            text: msg.text.clone(),
            author: msg.author.clone(),
            timestamp: msg.timestamp,
            display_time: msg.display_time(),
        }
    }
}
