//! HTTP handlers for waste endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use shared::ItemView;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::waste::{RemoveWasteInput, WasteRemoval, WasteService, WasteSummary};
use crate::AppState;

/// Expired stock and waste recorded so far
pub async fn get_waste_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<WasteSummary>> {
    let service = WasteService::new(state.store.clone());
    let summary = service
        .waste_summary(current_user.0.owner_id, Utc::now())
        .await?;
    Ok(Json(summary))
}

/// Write off part of an expired item
pub async fn remove_item_waste(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<RemoveWasteInput>,
) -> AppResult<Json<ItemView>> {
    let service = WasteService::new(state.store.clone());
    let item = service
        .remove_partial_quantity(current_user.0.owner_id, item_id, input, Utc::now())
        .await?;
    Ok(Json(item))
}

/// Remove every expired item
pub async fn remove_expired_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<WasteRemoval>> {
    let service = WasteService::new(state.store.clone());
    let removal = service
        .remove_all_expired(current_user.0.owner_id, Utc::now())
        .await?;
    Ok(Json(removal))
}
