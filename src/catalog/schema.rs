use rusqlite::Connection;

use crate::error::Result;

/// Creates the catalog tables and indexes when they do not exist yet.
///
/// `seq` columns alias the SQLite rowid, so insertion order is the browse
/// order and cursors can address rows by ordinal.
pub(crate) fn ensure(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS instances (
            seq INTEGER PRIMARY KEY,
            id TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            image TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            seq INTEGER PRIMARY KEY,
            id TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            image TEXT,
            instance_id TEXT REFERENCES instances (id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sources (
            item_id TEXT NOT NULL REFERENCES items (id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            type TEXT NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (item_id, position)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ownership (
            user_id TEXT NOT NULL REFERENCES users (id),
            item_id TEXT NOT NULL REFERENCES items (id) ON DELETE CASCADE,
            granted_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, item_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_kind_seq ON items (kind, seq)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_instance ON items (instance_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ownership_item ON ownership (item_id)",
        [],
    )?;

    Ok(())
}
