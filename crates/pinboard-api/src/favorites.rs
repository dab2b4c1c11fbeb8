use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use pinboard_types::api::{FavoriteListResponse, FavoriteRequest, SuccessResponse};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct FavoritesQuery {
    pub user_id: Option<i64>,
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Query(query): Query<FavoritesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::Validation("user_id is required".into()))?;

    let db = state.clone();
    let favorites = tokio::task::spawn_blocking(move || db.db.favorite_pin_ids(user_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(FavoriteListResponse { favorites }))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user_id, pin_id) = require_pair(&req)?;

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.add_favorite(user_id, pin_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    // Success whether or not a new row was created; the insert is
    // idempotent and deliberately does not report which case happened.
    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user_id, pin_id) = require_pair(&req)?;

    let db = state.clone();
    // Removal is reported successful even when no matching row existed.
    let _found = tokio::task::spawn_blocking(move || db.db.remove_favorite(user_id, pin_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(SuccessResponse { success: true }))
}

fn require_pair(req: &FavoriteRequest) -> Result<(i64, i64), ApiError> {
    match (req.user_id, req.pin_id) {
        (Some(user_id), Some(pin_id)) => Ok((user_id, pin_id)),
        _ => Err(ApiError::Validation(
            "user_id and pin_id are required".into(),
        )),
    }
}
