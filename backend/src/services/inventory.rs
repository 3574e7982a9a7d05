//! Inventory ledger: item lifecycle, stock adjustments and read projections

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    expiry, sort_by_priority, validation, InventoryItem, ItemView, MovementType, StockMovement,
    UnknownVariant, DEFAULT_MAX_THRESHOLD, DEFAULT_MIN_THRESHOLD, DEFAULT_UNIT,
};
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure};
use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, MovementFilter, StoreTx};

pub const INITIAL_STOCK_NOTE: &str = "Initial stock";
pub const MANUAL_ADJUSTMENT_NOTE: &str = "Manual adjustment";

/// Inventory service for managing items and their stock levels
#[derive(Clone)]
pub struct InventoryService {
    store: DynStore,
    settings: InventoryConfig,
}

/// Input for creating an inventory item
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Item name is required and must not exceed 255 characters"
    ))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Category must not exceed 100 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 100, message = "Barcode must not exceed 100 characters"))]
    pub barcode: Option<String>,
    #[validate(length(max = 100, message = "SKU must not exceed 100 characters"))]
    pub sku: Option<String>,
    #[validate(length(max = 50, message = "Unit must not exceed 50 characters"))]
    pub unit: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    pub quantity: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "Minimum threshold must be a non-negative integer"))]
    pub min_threshold: Option<i32>,
    pub max_threshold: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub supplier: Option<String>,
    pub external_id: Option<Uuid>,
}

/// Input for updating an inventory item; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Item name is required and must not exceed 255 characters"
    ))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Category must not exceed 100 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 100, message = "Barcode must not exceed 100 characters"))]
    pub barcode: Option<String>,
    #[validate(length(max = 100, message = "SKU must not exceed 100 characters"))]
    pub sku: Option<String>,
    #[validate(length(max = 50, message = "Unit must not exceed 50 characters"))]
    pub unit: Option<String>,
    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    pub quantity: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    #[validate(range(min = 0, message = "Minimum threshold must be a non-negative integer"))]
    pub min_threshold: Option<i32>,
    /// `null` removes the maximum
    #[serde(default, deserialize_with = "crate::services::nullable")]
    pub max_threshold: Option<Option<i32>>,
    /// `null` removes the expiry date
    #[serde(default, deserialize_with = "crate::services::nullable")]
    pub expiry_date: Option<Option<NaiveDate>>,
    pub batch_number: Option<String>,
    pub supplier: Option<String>,
}

/// Input for a manual stock correction
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockInput {
    /// Requested change; the applied change is clamped so stock never drops below zero
    pub delta: i32,
    #[validate(length(max = 500, message = "Note must not exceed 500 characters"))]
    pub note: Option<String>,
}

/// Item list filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatusFilter {
    #[default]
    All,
    LowStock,
    OutOfStock,
    Expired,
    Expiring,
}

impl FromStr for ItemStatusFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ItemStatusFilter::All),
            "low_stock" => Ok(ItemStatusFilter::LowStock),
            "out_of_stock" => Ok(ItemStatusFilter::OutOfStock),
            "expired" => Ok(ItemStatusFilter::Expired),
            "expiring" => Ok(ItemStatusFilter::Expiring),
            other => Err(UnknownVariant::new("item status", other)),
        }
    }
}

/// Single item with its latest stock movements
#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: ItemView,
    pub recent_movements: Vec<StockMovement>,
}

/// Inventory totals for the dashboard header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total_items: i64,
    pub total_quantity: i64,
    /// Σ quantity × cost price
    pub total_value: Decimal,
    pub total_selling_value: Decimal,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub expired_count: i64,
    pub expiring_count: i64,
}

/// A category in use, for pickers and filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub item_count: i64,
}

/// Sort key for low-stock lists: fraction of the minimum threshold on hand
fn stock_ratio(item: &InventoryItem) -> Decimal {
    Decimal::from(item.quantity) / Decimal::from(item.min_threshold.max(1))
}

async fn reject_conflict(
    tx: &mut Box<dyn StoreTx>,
    owner_id: Uuid,
    item: &InventoryItem,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    match tx
        .find_conflict(owner_id, &item.name, item.barcode.as_deref(), exclude)
        .await?
    {
        Some(field) => Err(AppError::conflict(
            field.as_str(),
            format!("An item with this {} already exists", field.as_str()),
        )),
        None => Ok(()),
    }
}

fn check_item_rules(item: &InventoryItem) -> AppResult<()> {
    if item.name.is_empty() {
        return Err(AppError::validation("name", "Item name is required"));
    }
    let price_field = if item.cost_price < Decimal::ZERO {
        "cost_price"
    } else {
        "selling_price"
    };
    ensure(
        price_field,
        validation::validate_prices(item.cost_price, item.selling_price),
    )?;
    ensure(
        "min_threshold",
        validation::validate_thresholds(item.min_threshold, item.max_threshold),
    )?;
    ensure("quantity", validation::validate_stock_quantity(item.quantity))
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(store: DynStore, settings: InventoryConfig) -> Self {
        Self { store, settings }
    }

    /// Add an item; opening stock is recorded as a purchase movement
    pub async fn add_item(
        &self,
        owner_id: Uuid,
        input: CreateItemInput,
        now: DateTime<Utc>,
    ) -> AppResult<ItemView> {
        input.validate()?;

        let item = InventoryItem {
            id: Uuid::new_v4(),
            owner_id,
            external_id: input.external_id,
            name: input.name.trim().to_string(),
            description: clean(input.description),
            category: clean(input.category),
            barcode: clean(input.barcode),
            sku: clean(input.sku),
            unit: clean(input.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            quantity: input.quantity,
            cost_price: validation::to_money(input.cost_price),
            selling_price: validation::to_money(input.selling_price),
            min_threshold: input.min_threshold.unwrap_or(DEFAULT_MIN_THRESHOLD),
            max_threshold: Some(input.max_threshold.unwrap_or(DEFAULT_MAX_THRESHOLD)),
            expiry_date: input.expiry_date,
            batch_number: clean(input.batch_number),
            supplier: clean(input.supplier),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        check_item_rules(&item)?;

        let mut tx = self.store.begin().await?;
        reject_conflict(&mut tx, owner_id, &item, None).await?;
        tx.insert_item(&item).await?;

        if item.quantity > 0 {
            let movement = StockMovement::record(
                owner_id,
                item.id,
                MovementType::Purchase,
                0,
                item.quantity,
                now,
            )
            .with_note(INITIAL_STOCK_NOTE);
            tx.insert_movement(&movement).await?;
        }
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            item_id = %item.id,
            quantity = item.quantity,
            "Inventory item added: {}",
            item.name
        );

        Ok(item.view(now))
    }

    /// Merge changes into an item. A quantity change is logged as an adjustment.
    pub async fn update_item(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
        now: DateTime<Utc>,
    ) -> AppResult<ItemView> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_item(owner_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let mut item = current.clone();
        if let Some(name) = input.name {
            item.name = name.trim().to_string();
        }
        if input.description.is_some() {
            item.description = clean(input.description);
        }
        if input.category.is_some() {
            item.category = clean(input.category);
        }
        if input.barcode.is_some() {
            item.barcode = clean(input.barcode);
        }
        if input.sku.is_some() {
            item.sku = clean(input.sku);
        }
        if let Some(unit) = clean(input.unit) {
            item.unit = unit;
        }
        if let Some(quantity) = input.quantity {
            item.quantity = quantity;
        }
        if let Some(cost_price) = input.cost_price {
            item.cost_price = validation::to_money(cost_price);
        }
        if let Some(selling_price) = input.selling_price {
            item.selling_price = validation::to_money(selling_price);
        }
        if let Some(min_threshold) = input.min_threshold {
            item.min_threshold = min_threshold;
        }
        if let Some(max_threshold) = input.max_threshold {
            item.max_threshold = max_threshold;
        }
        if let Some(expiry_date) = input.expiry_date {
            item.expiry_date = expiry_date;
        }
        if input.batch_number.is_some() {
            item.batch_number = clean(input.batch_number);
        }
        if input.supplier.is_some() {
            item.supplier = clean(input.supplier);
        }
        check_item_rules(&item)?;

        let identity_changed = item.name.to_lowercase() != current.name.to_lowercase()
            || item.barcode != current.barcode;
        if identity_changed {
            reject_conflict(&mut tx, owner_id, &item, Some(item_id)).await?;
        }

        item.updated_at = now;
        tx.update_item(&item).await?;

        if item.quantity != current.quantity {
            let movement = StockMovement::record(
                owner_id,
                item_id,
                MovementType::Adjustment,
                current.quantity,
                item.quantity,
                now,
            )
            .with_note(MANUAL_ADJUSTMENT_NOTE);
            tx.insert_movement(&movement).await?;
        }
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            item_id = %item_id,
            previous_quantity = current.quantity,
            new_quantity = item.quantity,
            "Inventory item updated"
        );

        Ok(item.view(now))
    }

    /// Soft delete: the item leaves every active query but its sales and
    /// movements keep referring to it
    pub async fn delete_item(&self, owner_id: Uuid, item_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let mut item = tx
            .lock_item(owner_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        item.is_active = false;
        item.updated_at = now;
        tx.update_item(&item).await?;
        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, item_id = %item_id, "Inventory item deleted");
        Ok(())
    }

    /// Apply `delta` clamped at zero. The movement records the change actually
    /// applied, and nothing is recorded when that change is zero.
    pub async fn adjust_stock(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        input: AdjustStockInput,
        now: DateTime<Utc>,
    ) -> AppResult<ItemView> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let mut item = tx
            .lock_item(owner_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let previous = item.quantity;
        let target = (i64::from(previous) + i64::from(input.delta)).clamp(0, i64::from(i32::MAX));
        item.quantity = target as i32;

        if item.quantity != previous {
            item.updated_at = now;
            tx.update_item(&item).await?;

            let note = clean(input.note).unwrap_or_else(|| MANUAL_ADJUSTMENT_NOTE.to_string());
            let movement = StockMovement::record(
                owner_id,
                item_id,
                MovementType::Adjustment,
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
            requested = input.delta,
            applied = item.quantity - previous,
            new_quantity = item.quantity,
            "Stock adjusted"
        );

        Ok(item.view(now))
    }

    /// Get an item with its most recent movements
    pub async fn get_item(&self, owner_id: Uuid, item_id: Uuid, now: DateTime<Utc>) -> AppResult<ItemDetail> {
        let item = self
            .store
            .find_item(owner_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let recent_movements = self
            .store
            .list_movements(
                owner_id,
                &MovementFilter::for_item(item_id).limit(self.settings.recent_movements_limit),
            )
            .await?;

        Ok(ItemDetail {
            item: item.view(now),
            recent_movements,
        })
    }

    /// List active items, optionally narrowed to a stock or expiry status
    pub async fn list_items(
        &self,
        owner_id: Uuid,
        status: ItemStatusFilter,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ItemView>> {
        let items = match status {
            ItemStatusFilter::All => self.store.list_items(owner_id, false).await?,
            ItemStatusFilter::LowStock => self.low_stock(owner_id).await?,
            ItemStatusFilter::OutOfStock => self.out_of_stock(owner_id).await?,
            ItemStatusFilter::Expired => self.expired(owner_id, now).await?,
            ItemStatusFilter::Expiring => {
                self.expiring(owner_id, now, self.settings.expiring_window_days)
                    .await?
            }
        };

        Ok(items.iter().map(|item| item.view(now)).collect())
    }

    /// Items at or below their minimum threshold, emptiest (relative) first
    pub async fn low_stock(&self, owner_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self
            .store
            .list_items(owner_id, false)
            .await?
            .into_iter()
            .filter(InventoryItem::is_low_stock)
            .collect();
        items.sort_by_cached_key(stock_ratio);
        Ok(items)
    }

    pub async fn out_of_stock(&self, owner_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        Ok(self
            .store
            .list_items(owner_id, false)
            .await?
            .into_iter()
            .filter(InventoryItem::is_out_of_stock)
            .collect())
    }

    /// Items not yet expired that expire within `within_days`, most urgent first
    pub async fn expiring(
        &self,
        owner_id: Uuid,
        now: DateTime<Utc>,
        within_days: i64,
    ) -> AppResult<Vec<InventoryItem>> {
        let items: Vec<InventoryItem> = self
            .store
            .list_items(owner_id, false)
            .await?
            .into_iter()
            .filter(|item| {
                item.expiry_date
                    .map(|date| expiry::days_until_expiry(date, now))
                    .is_some_and(|days| (0..=within_days).contains(&days))
            })
            .collect();
        Ok(sort_by_priority(items, now))
    }

    /// Items past their expiry date, longest expired first
    pub async fn expired(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<InventoryItem>> {
        let items: Vec<InventoryItem> = self
            .store
            .list_items(owner_id, false)
            .await?
            .into_iter()
            .filter(|item| item.expiry_date.is_some_and(|date| expiry::is_expired(date, now)))
            .collect();
        Ok(sort_by_priority(items, now))
    }

    /// Count and valuation totals over active items
    pub async fn summary(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<InventorySummary> {
        let items = self.store.list_items(owner_id, false).await?;
        let window = self.settings.expiring_window_days;

        Ok(items.iter().fold(InventorySummary::default(), |mut acc, item| {
            let days = item
                .expiry_date
                .map(|date| expiry::days_until_expiry(date, now));
            acc.total_items += 1;
            acc.total_quantity += i64::from(item.quantity);
            acc.total_value += item.total_cost_value();
            acc.total_selling_value += item.total_selling_value();
            if item.is_low_stock() {
                acc.low_stock_count += 1;
            }
            if item.is_out_of_stock() {
                acc.out_of_stock_count += 1;
            }
            match days {
                Some(d) if d < 0 => acc.expired_count += 1,
                Some(d) if d <= window => acc.expiring_count += 1,
                _ => {}
            }
            acc
        }))
    }

    /// Categories of active items, alphabetical. Names differing only in case
    /// count as one, shown as first seen.
    pub async fn categories(&self, owner_id: Uuid) -> AppResult<Vec<CategorySummary>> {
        let items = self.store.list_items(owner_id, false).await?;

        let mut by_key: BTreeMap<String, CategorySummary> = BTreeMap::new();
        for category in items.iter().filter_map(|item| item.category.as_deref()) {
            by_key
                .entry(category.to_lowercase())
                .or_insert_with(|| CategorySummary {
                    name: category.to_string(),
                    item_count: 0,
                })
                .item_count += 1;
        }
        Ok(by_key.into_values().collect())
    }

    /// Full audit trail of an active item, newest first
    pub async fn movements(&self, owner_id: Uuid, item_id: Uuid) -> AppResult<Vec<StockMovement>> {
        if self.store.find_item(owner_id, item_id).await?.is_none() {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }
        self.store
            .list_movements(owner_id, &MovementFilter::for_item(item_id))
            .await
    }

    /// Active items with their derived state, for alert and recommendation views
    pub async fn active_items(&self, owner_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        self.store.list_items(owner_id, false).await
    }
}
