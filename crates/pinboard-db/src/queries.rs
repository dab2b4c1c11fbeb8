use crate::Database;
use crate::models::{CommentRow, CreatedPinRow, PinRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

/// Sort order for the pin listing. Unrecognized query values fall back to
/// `Newest`, matching the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinSort {
    Newest,
    Oldest,
    Views,
}

impl PinSort {
    pub fn from_param(s: &str) -> Self {
        match s {
            "views" => PinSort::Views,
            "oldest" => PinSort::Oldest,
            _ => PinSort::Newest,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            PinSort::Views => "ORDER BY p.views DESC",
            PinSort::Oldest => "ORDER BY p.created_at ASC",
            PinSort::Newest => "ORDER BY p.created_at DESC",
        }
    }
}

impl Database {
    // -- Comments --

    pub fn comments_for_pin(&self, pin_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, pin_id))
    }

    /// Insert a comment and resolve the author username in the same
    /// connection scope, so no other writer can slip between the two
    /// statements.
    pub fn create_comment(&self, pin_id: i64, author_id: i64, content: &str) -> Result<CommentRow> {
        self.with_conn(|conn| {
            let (id, created_at): (i64, String) = conn.query_row(
                "INSERT INTO comments (pin_id, author_id, content)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, created_at",
                rusqlite::params![pin_id, author_id, content],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let author_username = query_username(conn, author_id)?;

            Ok(CommentRow {
                id,
                content: content.to_string(),
                created_at,
                author_id,
                author_username,
            })
        })
    }

    // -- Favorites --

    pub fn favorite_pin_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT pin_id FROM favorites WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    /// Idempotent insert: a (user_id, pin_id) pair that already exists is a
    /// no-op, not an error.
    pub fn add_favorite(&self, user_id: i64, pin_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO favorites (user_id, pin_id) VALUES (?1, ?2)
                 ON CONFLICT (user_id, pin_id) DO NOTHING",
                [user_id, pin_id],
            )?;
            Ok(())
        })
    }

    /// Soft-delete: nulls the owner instead of deleting the row. Returns
    /// whether a matching row existed; callers report success either way.
    pub fn remove_favorite(&self, user_id: i64, pin_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM favorites WHERE user_id = ?1 AND pin_id = ?2",
                    [user_id, pin_id],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(id) => {
                    conn.execute("UPDATE favorites SET user_id = NULL WHERE id = ?1", [id])?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    // -- Pins --

    pub fn search_pins(&self, search: &str, sort: PinSort) -> Result<Vec<PinRow>> {
        self.with_conn(|conn| query_pins(conn, search, sort))
    }

    pub fn create_pin(&self, title: &str, content: &str, author_id: i64) -> Result<CreatedPinRow> {
        self.with_conn(|conn| {
            let (id, views, created_at): (i64, i64, String) = conn.query_row(
                "INSERT INTO pins (title, content, author_id)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, views, created_at",
                rusqlite::params![title, content, author_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let author_username = query_username(conn, author_id)?;

            Ok(CreatedPinRow {
                id,
                title: title.to_string(),
                content: content.to_string(),
                views,
                created_at,
                author_id,
                author_username,
            })
        })
    }

    /// Atomic increment. Returns the new count, or `None` when no pin
    /// matches.
    pub fn increment_views(&self, pin_id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let views = conn
                .query_row(
                    "UPDATE pins SET views = views + 1 WHERE id = ?1 RETURNING views",
                    [pin_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(views)
        })
    }
}

fn query_comments(conn: &Connection, pin_id: i64) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, c.created_at, u.username, u.id
         FROM comments c
         JOIN users u ON c.author_id = u.id
         WHERE c.pin_id = ?1
         ORDER BY c.created_at ASC",
    )?;

    let rows = stmt
        .query_map([pin_id], |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                content: row.get(1)?,
                created_at: row.get(2)?,
                author_username: row.get(3)?,
                author_id: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_pins(conn: &Connection, search: &str, sort: PinSort) -> Result<Vec<PinRow>> {
    // SQLite LIKE is case-insensitive for ASCII, which matches the
    // contract's substring search. The comment count is a correlated
    // subquery so the whole listing stays one statement.
    let sql = format!(
        "SELECT p.id, p.title, p.content, p.views, p.created_at,
                u.username, u.id,
                (SELECT COUNT(*) FROM comments WHERE pin_id = p.id)
         FROM pins p
         JOIN users u ON p.author_id = u.id
         WHERE p.title LIKE '%' || ?1 || '%'
         {}",
        sort.order_clause()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([search], |row| {
            Ok(PinRow {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                views: row.get(3)?,
                created_at: row.get(4)?,
                author_username: row.get(5)?,
                author_id: row.get(6)?,
                comment_count: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_username(conn: &Connection, user_id: i64) -> Result<String> {
    let username: Option<String> = conn
        .query_row("SELECT username FROM users WHERE id = ?1", [user_id], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(username.unwrap_or_else(|| "Unknown".to_string()))
}
