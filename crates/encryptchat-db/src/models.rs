//! Database row types: these map directly to SQLite rows.
//! Distinct from encryptchat-types models to keep the DB layer independent.

/// A stored message. `text` is still in stored (shifted) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: String,
    pub text: Option<String>,
    pub author: String,
    pub timestamp: i64,
}

/// Position in the newest-first message list. Rows are totally ordered by
/// `(timestamp, id)`, so messages sharing a millisecond are never skipped.
///
/// An empty `id` selects everything strictly older than `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: i64,
    pub id: String,
}

impl Cursor {
    pub fn new(timestamp: i64, id: impl Into<String>) -> Self {
        Self {
            timestamp,
            id: id.into(),
        }
    }

    /// The cursor just past `row`, for fetching the next (older) page.
    pub fn after(row: &MessageRow) -> Self {
        Self::new(row.timestamp, row.id.clone())
    }
}
