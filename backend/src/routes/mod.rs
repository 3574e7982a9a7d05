//! Route definitions for the Gebeya inventory API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Protected routes - inventory items
        .nest("/items", item_routes())
        // Protected routes - sales
        .nest("/sales", sale_routes())
        // Protected routes - expiry alerts and recommendations
        .nest("/alerts", alert_routes())
        // Protected routes - waste
        .nest("/waste", waste_routes())
        // Protected routes - analytics
        .nest("/analytics", analytics_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        // Health check (public)
        .route("/health", get(handlers::health_check))
}

/// Inventory item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/summary", get(handlers::get_inventory_summary))
        .route("/categories", get(handlers::list_categories))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .patch(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/:item_id/adjust", post(handlers::adjust_stock))
        .route("/:item_id/movements", get(handlers::list_item_movements))
}

/// Sale routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::record_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale)
                .patch(handlers::update_sale)
                .delete(handlers::reverse_sale),
        )
}

/// Alert routes
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/expiry", get(handlers::get_expiry_alerts))
        .route("/recommendations", get(handlers::get_recommendations))
}

/// Waste routes
fn waste_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_waste_summary))
        .route("/items/:item_id/remove", post(handlers::remove_item_waste))
        .route("/remove-expired", post(handlers::remove_expired_items))
}

/// Analytics routes
fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/comparison", get(handlers::get_comparison))
        .route("/profit", get(handlers::get_profit_report))
        .route("/sales", get(handlers::get_sales_report))
        .route("/inventory", get(handlers::get_inventory_report))
}
