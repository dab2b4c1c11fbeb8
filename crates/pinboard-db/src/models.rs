/// Database row types — these map directly to SQLite rows.
/// Distinct from the pinboard-types API models to keep the DB layer
/// independent; timestamps stay as the raw TEXT SQLite stores.

pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub author_id: i64,
    pub author_username: String,
}

pub struct PinRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub created_at: String,
    pub author_id: i64,
    pub author_username: String,
    pub comment_count: i64,
}

pub struct CreatedPinRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub created_at: String,
    pub author_id: i64,
    pub author_username: String,
}
