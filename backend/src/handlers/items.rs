//! HTTP handlers for inventory item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{ItemView, StockMovement};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AdjustStockInput, CategorySummary, CreateItemInput, InventoryService, InventorySummary,
    ItemDetail, ItemStatusFilter, UpdateItemInput,
};
use crate::AppState;

fn inventory_service(state: &AppState) -> InventoryService {
    InventoryService::new(state.store.clone(), state.config.inventory.clone())
}

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    #[serde(default)]
    pub status: ItemStatusFilter,
}

/// Add an item to the inventory
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<ItemView>)> {
    let item = inventory_service(&state)
        .add_item(current_user.0.owner_id, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List active items, optionally filtered by status
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ItemListQuery>,
) -> AppResult<Json<Vec<ItemView>>> {
    let items = inventory_service(&state)
        .list_items(current_user.0.owner_id, query.status, Utc::now())
        .await?;
    Ok(Json(items))
}

/// Get an item with its recent movements
pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemDetail>> {
    let item = inventory_service(&state)
        .get_item(current_user.0.owner_id, item_id, Utc::now())
        .await?;
    Ok(Json(item))
}

/// Update an item
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<ItemView>> {
    let item = inventory_service(&state)
        .update_item(current_user.0.owner_id, item_id, input, Utc::now())
        .await?;
    Ok(Json(item))
}

/// Soft-delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    inventory_service(&state)
        .delete_item(current_user.0.owner_id, item_id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a manual stock correction
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<ItemView>> {
    let item = inventory_service(&state)
        .adjust_stock(current_user.0.owner_id, item_id, input, Utc::now())
        .await?;
    Ok(Json(item))
}

/// Full movement history of an item
pub async fn list_item_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let movements = inventory_service(&state)
        .movements(current_user.0.owner_id, item_id)
        .await?;
    Ok(Json(movements))
}

/// Inventory totals
pub async fn get_inventory_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<InventorySummary>> {
    let summary = inventory_service(&state)
        .summary(current_user.0.owner_id, Utc::now())
        .await?;
    Ok(Json(summary))
}

/// Categories in use
pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CategorySummary>>> {
    let categories = inventory_service(&state)
        .categories(current_user.0.owner_id)
        .await?;
    Ok(Json(categories))
}
