use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use pinboard_db::PinSort;
use pinboard_types::api::{
    CreatePinRequest, IncrementViewsRequest, PinCreatedResponse, PinListResponse, PinSummary,
    ViewsResponse,
};

use crate::error::ApiError;
use crate::{AppState, parse_timestamp};

#[derive(Debug, Deserialize)]
pub struct PinsQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_sort")]
    pub sort: String,
}

fn default_sort() -> String {
    "newest".into()
}

pub async fn list_pins(
    State(state): State<AppState>,
    Query(query): Query<PinsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sort = PinSort::from_param(&query.sort);

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.search_pins(&query.search, sort))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let pins = rows
        .into_iter()
        .map(|row| PinSummary {
            id: row.id,
            title: row.title,
            content: row.content,
            views: row.views,
            date: parse_timestamp(&row.created_at),
            author: row.author_username,
            author_id: row.author_id,
            comment_count: row.comment_count,
        })
        .collect();

    Ok(Json(PinListResponse { pins }))
}

pub async fn create_pin(
    State(state): State<AppState>,
    Json(req): Json<CreatePinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.as_deref().map(str::trim).unwrap_or_default();
    let content = req.content.as_deref().map(str::trim).unwrap_or_default();
    let author_id = match req.author_id {
        Some(author_id) if !title.is_empty() && !content.is_empty() => author_id,
        _ => {
            return Err(ApiError::Validation(
                "Title, content and author_id are required".into(),
            ));
        }
    };

    let db = state.clone();
    let title = title.to_string();
    let content = content.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.create_pin(&title, &content, author_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok((
        StatusCode::CREATED,
        Json(PinCreatedResponse {
            id: row.id,
            title: row.title,
            content: row.content,
            views: row.views,
            date: parse_timestamp(&row.created_at),
            author: row.author_username,
            author_id: row.author_id,
        }),
    ))
}

pub async fn increment_views(
    State(state): State<AppState>,
    Json(req): Json<IncrementViewsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pin_id = req
        .pin_id
        .ok_or_else(|| ApiError::Validation("pin_id is required".into()))?;

    let db = state.clone();
    let views = tokio::task::spawn_blocking(move || db.db.increment_views(pin_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("Pin not found".into()))?;

    Ok(Json(ViewsResponse { views }))
}
