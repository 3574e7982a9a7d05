//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use shared::SaleDetail;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sales::{RecordSaleInput, SaleList, SaleQuery, SaleService, UpdateSaleInput};
use crate::AppState;

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleDetail>)> {
    let service = SaleService::new(state.store.clone());
    let sale = service
        .record_sale(current_user.0.owner_id, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// List sales with totals
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SaleQuery>,
) -> AppResult<Json<SaleList>> {
    let service = SaleService::new(state.store.clone());
    let sales = service.list_sales(current_user.0.owner_id, &query).await?;
    Ok(Json(sales))
}

/// Get a sale
pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleDetail>> {
    let service = SaleService::new(state.store.clone());
    let sale = service.get_sale(current_user.0.owner_id, sale_id).await?;
    Ok(Json(sale))
}

/// Edit sale metadata
pub async fn update_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSaleInput>,
) -> AppResult<Json<SaleDetail>> {
    let service = SaleService::new(state.store.clone());
    let sale = service
        .update_sale(current_user.0.owner_id, sale_id, input)
        .await?;
    Ok(Json(sale))
}

/// Reverse a sale and restore its stock
pub async fn reverse_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = SaleService::new(state.store.clone());
    service
        .reverse_sale(current_user.0.owner_id, sale_id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
