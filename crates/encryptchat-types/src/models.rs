use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used when showing a message's timestamp next to its text.
pub const DISPLAY_TIME_FORMAT: &str = "%d-%m-%Y (%H:%M:%S)";

/// A single chat message: text, who wrote it, and when (epoch milliseconds).
///
/// The same shape is used for both the stored form (text encoded) and the
/// displayed form (text decoded); only `text` differs between the two.
/// Field names on the wire match the records already in the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "messageText")]
    pub text: String,
    #[serde(rename = "messageUserName")]
    pub author: String,
    #[serde(rename = "messageTime")]
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a message stamped with the current wall-clock time.
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Same author and timestamp, different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: self.author.clone(),
            timestamp: self.timestamp,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// `dd-MM-yyyy (HH:mm:ss)` in UTC, or an empty string if the timestamp is
    /// out of range.
    pub fn display_time(&self) -> String {
        self.created_at()
            .map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }
}
