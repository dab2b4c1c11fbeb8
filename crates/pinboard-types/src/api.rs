use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Comments --

/// Body of `POST /comments`. Fields are optional so that a missing field
/// produces a field-specific 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub pin_id: Option<i64>,
    pub author_id: Option<i64>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub date: DateTime<Utc>,
    pub author: String,
    pub author_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
}

// -- Favorites --

/// Body of `POST /favorites` and `DELETE /favorites`.
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub user_id: Option<i64>,
    pub pin_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteListResponse {
    pub favorites: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// -- Pins --

#[derive(Debug, Deserialize)]
pub struct CreatePinRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author_id: Option<i64>,
}

/// A pin as returned by `GET /pins`, annotated with its comment count.
#[derive(Debug, Serialize)]
pub struct PinSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub date: DateTime<Utc>,
    pub author: String,
    pub author_id: i64,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct PinListResponse {
    pub pins: Vec<PinSummary>,
}

/// A freshly created pin. No comment count: it is zero by construction.
#[derive(Debug, Serialize)]
pub struct PinCreatedResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub date: DateTime<Utc>,
    pub author: String,
    pub author_id: i64,
}

/// Body of `PUT /pins`.
#[derive(Debug, Deserialize)]
pub struct IncrementViewsRequest {
    pub pin_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: i64,
}
