//! HTTP handlers for expiry alerts and sales recommendations

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{generate_alerts, recommendations, AlertCounts, ExpiryAlert, Recommendation};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::InventoryService;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ExpiryAlertsResponse {
    pub alerts: Vec<ExpiryAlert>,
    pub counts: AlertCounts,
    /// Alerts before truncation
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

/// Expiry alerts, most urgent first
pub async fn get_expiry_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ExpiryAlertsResponse>> {
    let service = InventoryService::new(state.store.clone(), state.config.inventory.clone());
    let items = service.active_items(current_user.0.owner_id).await?;

    let mut alerts = generate_alerts(&items, Utc::now());
    let counts = AlertCounts::tally(&alerts);
    let total = alerts.len();
    alerts.truncate(state.config.inventory.alert_limit);

    Ok(Json(ExpiryAlertsResponse {
        alerts,
        counts,
        total,
    }))
}

/// Items to push at the counter
pub async fn get_recommendations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let service = InventoryService::new(state.store.clone(), state.config.inventory.clone());
    let items = service.active_items(current_user.0.owner_id).await?;
    let limit = query
        .limit
        .unwrap_or(state.config.inventory.recommendation_limit);

    Ok(Json(recommendations(&items, Utc::now(), limit)))
}
