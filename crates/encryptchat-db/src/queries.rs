use crate::Database;
use crate::models::{Cursor, MessageRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

impl Database {
    // -- Messages --

    /// Insert a message. `text` must already be in stored form.
    pub fn insert_message(&self, id: &str, text: &str, author: &str, timestamp: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, text, author, timestamp) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, text, author, timestamp],
            )?;
            Ok(())
        })
    }

    /// Newest first, ordered by `(timestamp, id)`. With `before`, only rows
    /// strictly before that cursor (keyset pagination).
    pub fn get_messages(&self, limit: u32, before: Option<&Cursor>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, limit, before))
    }

    /// The newest `limit` messages strictly newer than `since`, returned
    /// oldest first.
    pub fn get_messages_since(&self, since: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, text, author, timestamp FROM messages
                 WHERE timestamp > ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )?;

            let mut rows = stmt
                .query_map(rusqlite::params![since, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.reverse();

            Ok(rows)
        })
    }

    pub fn count_messages(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

fn query_messages(conn: &Connection, limit: u32, before: Option<&Cursor>) -> Result<Vec<MessageRow>> {
    let rows = if let Some(before) = before {
        let mut stmt = conn.prepare(
            "SELECT id, text, author, timestamp FROM messages
             WHERE (timestamp, id) < (?1, ?2)
             ORDER BY timestamp DESC, id DESC
             LIMIT ?3",
        )?;
        stmt.query_map(
            rusqlite::params![before.timestamp, before.id, limit],
            message_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        let mut stmt = conn.prepare(
            "SELECT id, text, author, timestamp FROM messages
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;
        stmt.query_map([limit], message_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    Ok(rows)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        author: row.get(2)?,
        timestamp: row.get(3)?,
    })
}
