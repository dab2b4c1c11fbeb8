use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS pins (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            views       INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            author_id   INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_pins_created
            ON pins(created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            pin_id      INTEGER NOT NULL REFERENCES pins(id),
            author_id   INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_comments_pin
            ON comments(pin_id, created_at);

        -- user_id is nullable: removing a favorite nulls the owner instead
        -- of deleting the row. NULLs are distinct in SQLite unique indexes,
        -- so removed rows drop out of the (user_id, pin_id) constraint.
        CREATE TABLE IF NOT EXISTS favorites (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER REFERENCES users(id),
            pin_id      INTEGER NOT NULL REFERENCES pins(id),
            UNIQUE(user_id, pin_id)
        );

        CREATE INDEX IF NOT EXISTS idx_favorites_user
            ON favorites(user_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
