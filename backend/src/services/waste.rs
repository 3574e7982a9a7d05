//! Write-offs of expired stock

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{expiry, InventoryItem, ItemView, MovementType, StockMovement};
use uuid::Uuid;
use validator::Validate;

use super::clean;
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, MovementFilter};

pub const PARTIAL_WASTE_NOTE: &str = "Expired stock removed";
pub const EXPIRED_REMOVAL_NOTE: &str = "Expired item removed from inventory";

/// Waste service for removing expired stock
#[derive(Clone)]
pub struct WasteService {
    store: DynStore,
}

/// Input for writing off part of an expired item
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemoveWasteInput {
    /// Clamped to the quantity on hand
    pub quantity: i32,
    #[validate(length(max = 500, message = "Note must not exceed 500 characters"))]
    pub note: Option<String>,
}

/// Result of a bulk removal
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WasteRemoval {
    pub items_removed: i64,
    pub quantity_removed: i64,
    /// Cost value of the quantity written off
    pub value_removed: Decimal,
    pub item_ids: Vec<Uuid>,
}

/// One expired item in the waste report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiredStock {
    pub item_id: Uuid,
    pub item_name: String,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub quantity: i32,
    pub cost_price: Decimal,
    pub waste_value: Decimal,
}

/// Current waste exposure plus waste already written off
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WasteSummary {
    pub expired_items: i64,
    pub expired_quantity: i64,
    /// Σ quantity × cost price over currently expired items
    pub waste_value: Decimal,
    /// Units recorded through waste movements to date
    pub recorded_waste_quantity: i64,
    pub items: Vec<ExpiredStock>,
}

fn days_left(item: &InventoryItem, now: DateTime<Utc>) -> Option<i64> {
    item.expiry_date
        .map(|date| expiry::days_until_expiry(date, now))
}

impl WasteService {
    /// Create a new WasteService instance
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// Write off part of an expired item's stock
    pub async fn remove_partial_quantity(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        input: RemoveWasteInput,
        now: DateTime<Utc>,
    ) -> AppResult<ItemView> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let mut item = tx
            .lock_item(owner_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        if !days_left(&item, now).is_some_and(|days| days < 0) {
            return Err(AppError::validation(
                "item_id",
                "Only expired items can be removed as waste",
            ));
        }

        let previous = item.quantity;
        let removed = input.quantity.clamp(0, previous);
        if removed > 0 {
            item.quantity = previous - removed;
            item.updated_at = now;
            tx.update_item(&item).await?;

            let note = clean(input.note).unwrap_or_else(|| PARTIAL_WASTE_NOTE.to_string());
            let movement = StockMovement::record(
                owner_id,
                item_id,
                MovementType::Waste,
                previous,
                item.quantity,
                now,
            )
            .with_note(note);
            tx.insert_movement(&movement).await?;
        }
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            item_id = %item_id,
            requested = input.quantity,
            removed,
            remaining = item.quantity,
            "Expired stock written off"
        );

        Ok(item.view(now))
    }

    /// Take every expired item out of the active ledger in one transaction
    pub async fn remove_all_expired(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<WasteRemoval> {
        let mut tx = self.store.begin().await?;
        let expired: Vec<InventoryItem> = tx
            .lock_active_items(owner_id)
            .await?
            .into_iter()
            .filter(|item| days_left(item, now).is_some_and(|days| days < 0))
            .collect();

        let mut removal = WasteRemoval::default();
        for mut item in expired {
            let previous = item.quantity;
            removal.items_removed += 1;
            removal.quantity_removed += i64::from(previous);
            removal.value_removed += item.total_cost_value();
            removal.item_ids.push(item.id);

            item.quantity = 0;
            item.is_active = false;
            item.updated_at = now;
            tx.update_item(&item).await?;

            if previous > 0 {
                let movement = StockMovement::record(
                    owner_id,
                    item.id,
                    MovementType::Waste,
                    previous,
                    0,
                    now,
                )
                .with_note(EXPIRED_REMOVAL_NOTE);
                tx.insert_movement(&movement).await?;
            }
        }
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            items = removal.items_removed,
            quantity = removal.quantity_removed,
            value = %removal.value_removed,
            "Expired items removed"
        );

        Ok(removal)
    }

    /// Expired stock still on the shelf and its cost value
    pub async fn waste_summary(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<WasteSummary> {
        let items = self.store.list_items(owner_id, false).await?;
        let waste_movements = self
            .store
            .list_movements(owner_id, &MovementFilter::of_type(MovementType::Waste))
            .await?;

        let mut expired: Vec<ExpiredStock> = items
            .iter()
            .filter_map(|item| {
                let expiry_date = item.expiry_date?;
                let days = expiry::days_until_expiry(expiry_date, now);
                (days < 0).then(|| ExpiredStock {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    expiry_date,
                    days_until_expiry: days,
                    quantity: item.quantity,
                    cost_price: item.cost_price,
                    waste_value: item.total_cost_value(),
                })
            })
            .collect();
        expired.sort_by_key(|stock| stock.days_until_expiry);

        Ok(WasteSummary {
            expired_items: expired.len() as i64,
            expired_quantity: expired.iter().map(|s| i64::from(s.quantity)).sum(),
            waste_value: expired.iter().map(|s| s.waste_value).sum(),
            recorded_waste_quantity: waste_movements
                .iter()
                .map(|m| i64::from(m.quantity_change).abs())
                .sum(),
            items: expired,
        })
    }
}
