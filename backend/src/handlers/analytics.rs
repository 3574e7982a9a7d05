//! HTTP handlers for analytics endpoints
//!
//! Analytics never fail on missing data; only auth can reject these.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::Period;

use crate::middleware::CurrentUser;
use crate::services::analytics::{
    AnalyticsService, Dashboard, InventoryReport, PeriodComparison, ProfitQuery, ProfitReport,
    SalesReport, SalesReportQuery,
};
use crate::AppState;

fn analytics_service(state: &AppState) -> AnalyticsService {
    AnalyticsService::new(state.store.clone(), state.config.inventory.clone())
}

#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    #[serde(default)]
    pub period: Period,
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Json<Dashboard> {
    Json(
        analytics_service(&state)
            .dashboard(current_user.0.owner_id, Utc::now())
            .await,
    )
}

pub async fn get_comparison(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ComparisonQuery>,
) -> Json<PeriodComparison> {
    Json(
        analytics_service(&state)
            .comparison(current_user.0.owner_id, query.period, Utc::now())
            .await,
    )
}

pub async fn get_profit_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ProfitQuery>,
) -> Json<ProfitReport> {
    Json(
        analytics_service(&state)
            .profit(current_user.0.owner_id, &query, Utc::now())
            .await,
    )
}

pub async fn get_sales_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SalesReportQuery>,
) -> Json<SalesReport> {
    Json(
        analytics_service(&state)
            .sales(current_user.0.owner_id, &query, Utc::now())
            .await,
    )
}

pub async fn get_inventory_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Json<InventoryReport> {
    Json(analytics_service(&state).inventory(current_user.0.owner_id).await)
}
