use rusqlite::Connection;

use crate::error::Result;

/// Initialise the alarm schema in `conn`.
///
/// Creates the `alarms` table (idempotent) plus an index on `enabled`
/// so the startup resync query stays cheap.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS alarms (
            id                TEXT    NOT NULL PRIMARY KEY,
            time              TEXT    NOT NULL,   -- HH:MM
            enabled           INTEGER NOT NULL DEFAULT 1,
            repeat_days       TEXT    NOT NULL,   -- JSON array of weekday names
            sound             TEXT    NOT NULL,
            snooze_enabled    INTEGER NOT NULL DEFAULT 1,
            snooze_minutes    INTEGER NOT NULL DEFAULT 10,
            vibration_enabled INTEGER NOT NULL DEFAULT 1,
            vibration         TEXT    NOT NULL,
            category          TEXT    NOT NULL,
            title             TEXT    NOT NULL,
            description       TEXT    NOT NULL DEFAULT '',
            created_at        TEXT    NOT NULL,   -- ISO-8601
            updated_at        TEXT    NOT NULL    -- ISO-8601
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_alarms_enabled ON alarms (enabled);
        ",
    )?;
    Ok(())
}
