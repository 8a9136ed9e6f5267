use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- text holds the shifted (stored-form) message text. It is nullable
        -- because records imported from older clients may lack it.
        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            text        TEXT,
            author      TEXT NOT NULL,
            timestamp   INTEGER NOT NULL
        );

        -- Pages are keyed on (timestamp, id)
        DROP INDEX IF EXISTS idx_messages_timestamp;
        CREATE INDEX IF NOT EXISTS idx_messages_timestamp_id
            ON messages(timestamp, id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
