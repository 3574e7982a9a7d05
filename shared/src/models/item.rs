//! Inventory item models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expiry::{self, Perishable};
use crate::types::UnknownVariant;

pub const DEFAULT_UNIT: &str = "pieces";
pub const DEFAULT_MIN_THRESHOLD: i32 = 5;
pub const DEFAULT_MAX_THRESHOLD: i32 = 1000;

/// A stock-keeping unit owned by one business account.
///
/// Only persisted attributes live here. Expiry status and priority depend on
/// the instant they are evaluated at and are produced by [`InventoryItem::view`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Reference used by external systems (barcode scanners, exports)
    pub external_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub unit: String,
    pub quantity: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub min_threshold: i32,
    pub max_threshold: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub supplier: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock level relative to the item's thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Normal,
    Overstock,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.quantity == 0 {
            StockStatus::OutOfStock
        } else if self.quantity <= self.min_threshold {
            StockStatus::LowStock
        } else if self.max_threshold.is_some_and(|max| self.quantity > max) {
            StockStatus::Overstock
        } else {
            StockStatus::Normal
        }
    }

    pub fn profit_per_unit(&self) -> Decimal {
        self.selling_price - self.cost_price
    }

    /// Capital tied up in current stock
    pub fn total_cost_value(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.cost_price)
    }

    pub fn total_selling_value(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.selling_price)
    }

    /// Markup over cost in percent, 0 when the item costs nothing or the
    /// ratio is not representable
    pub fn markup_percent(&self) -> Decimal {
        if self.cost_price.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_per_unit()
            .checked_div(self.cost_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::from(100)))
            .unwrap_or(Decimal::ZERO)
    }

    /// Project the item with its derived fields evaluated at `now`
    pub fn view(&self, now: DateTime<Utc>) -> ItemView {
        let days_until_expiry = self
            .expiry_date
            .map(|date| expiry::days_until_expiry(date, now));

        ItemView {
            is_expired: days_until_expiry.is_some_and(|days| days < 0),
            days_until_expiry,
            priority: expiry::priority_of(self, now),
            stock_status: self.stock_status(),
            profit_per_unit: self.profit_per_unit(),
            total_cost_value: self.total_cost_value(),
            total_selling_value: self.total_selling_value(),
            item: self.clone(),
        }
    }
}

impl Perishable for InventoryItem {
    fn item_id(&self) -> Uuid {
        self.id
    }

    fn item_name(&self) -> &str {
        &self.name
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }

    fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    fn min_threshold(&self) -> i32 {
        self.min_threshold
    }
}

/// Urgency tier derived from expiry proximity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(UnknownVariant::new("priority", other)),
        }
    }
}

/// Item as returned to callers: the stored record plus derived state
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub is_expired: bool,
    pub days_until_expiry: Option<i64>,
    pub priority: Priority,
    pub stock_status: StockStatus,
    pub profit_per_unit: Decimal,
    pub total_cost_value: Decimal,
    pub total_selling_value: Decimal,
}

impl Perishable for ItemView {
    fn item_id(&self) -> Uuid {
        self.item.id
    }

    fn item_name(&self) -> &str {
        &self.item.name
    }

    fn quantity(&self) -> i32 {
        self.item.quantity
    }

    fn expiry_date(&self) -> Option<NaiveDate> {
        self.item.expiry_date
    }

    fn min_threshold(&self) -> i32 {
        self.item.min_threshold
    }
}
