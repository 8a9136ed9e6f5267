use std::sync::Arc;

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use encryptchat_crypto::ShiftKey;
use encryptchat_db::Database;
use encryptchat_db::models::{Cursor, MessageRow};
use encryptchat_gateway::{Dispatcher, MessageEvent, MessageSource};
use encryptchat_types::api::MessageResponse;
use encryptchat_types::models::ChatMessage;

/// Shown in place of a stored message whose text cannot be displayed.
pub const PLACEHOLDER_TEXT: &str = "Error displaying this message";

pub type AppState = Arc<ChatRoom>;

/// The shared chat room. Text is encoded on the way into the store and
/// decoded on the way out; author and timestamp are never touched.
///
/// All methods that touch the database block; call them from
/// `spawn_blocking` when on the async runtime.
pub struct ChatRoom {
    db: Database,
    key: ShiftKey,
    dispatcher: Dispatcher,
}

impl ChatRoom {
    pub fn new(db: Database, key: ShiftKey, dispatcher: Dispatcher) -> Self {
        Self {
            db,
            key,
            dispatcher,
        }
    }

    pub fn key(&self) -> ShiftKey {
        self.key
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Store a new message and notify subscribers. Returns the plaintext record.
    pub fn send(&self, text: &str, author: &str) -> Result<(Uuid, ChatMessage)> {
        let id = Uuid::new_v4();
        let stored = ChatMessage::new(self.key.encode(text), author);

        self.db
            .insert_message(&id.to_string(), &stored.text, &stored.author, stored.timestamp)?;

        let plain = stored.with_text(text);
        self.dispatcher.broadcast(MessageEvent {
            id,
            message: stored,
        });

        Ok((id, plain))
    }

    /// Newest first, strictly before `before` when given. Rows are fetched
    /// eagerly, decoded lazily.
    pub fn history(
        &self,
        limit: u32,
        before: Option<&Cursor>,
    ) -> Result<impl Iterator<Item = (Uuid, ChatMessage)> + '_> {
        let rows = self.db.get_messages(limit, before)?;
        Ok(rows.into_iter().map(move |row| self.reveal_row(row)))
    }

    /// Decode one stored row for display.
    pub fn reveal_row(&self, row: MessageRow) -> (Uuid, ChatMessage) {
        let id = row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", row.id, e);
            Uuid::default()
        });

        let text = match row.text {
            Some(stored) => self.key.decode(&stored),
            None => {
                warn!("Message '{}' has no text", row.id);
                PLACEHOLDER_TEXT.to_string()
            }
        };

        (
            id,
            ChatMessage {
                text,
                author: row.author,
                timestamp: row.timestamp,
            },
        )
    }
}

impl MessageSource for ChatRoom {
    fn reveal(&self, event: &MessageEvent) -> MessageResponse {
        let plain = event.message.with_text(self.key.decode(&event.message.text));
        MessageResponse::from_message(event.id, &plain)
    }

    fn replay(&self, since: Option<i64>, limit: u32) -> Result<Vec<MessageResponse>> {
        let rows = self.db.get_messages_since(since.unwrap_or(i64::MIN), limit)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let (id, msg) = self.reveal_row(row);
                MessageResponse::from_message(id, &msg)
            })
            .collect())
    }
}
