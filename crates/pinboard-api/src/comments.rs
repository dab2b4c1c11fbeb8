use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use pinboard_types::api::{CommentListResponse, CommentResponse, CreateCommentRequest};

use crate::error::ApiError;
use crate::{AppState, parse_timestamp};

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub pin_id: Option<i64>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pin_id = query
        .pin_id
        .ok_or_else(|| ApiError::Validation("pin_id is required".into()))?;

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.comments_for_pin(pin_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let comments = rows
        .into_iter()
        .map(|row| CommentResponse {
            id: row.id,
            content: row.content,
            date: parse_timestamp(&row.created_at),
            author: row.author_username,
            author_id: row.author_id,
        })
        .collect();

    Ok(Json(CommentListResponse { comments }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.as_deref().map(str::trim).unwrap_or_default();
    let (pin_id, author_id) = match (req.pin_id, req.author_id) {
        (Some(pin_id), Some(author_id)) if !content.is_empty() => (pin_id, author_id),
        _ => {
            return Err(ApiError::Validation(
                "pin_id, author_id and content are required".into(),
            ));
        }
    };

    let db = state.clone();
    let content = content.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.create_comment(pin_id, author_id, &content))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: row.id,
            content: row.content,
            date: parse_timestamp(&row.created_at),
            author: row.author_username,
            author_id: row.author_id,
        }),
    ))
}
