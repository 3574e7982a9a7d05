//! Expiry alerts and sales recommendations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Priority;

/// Alert classification by days until expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Already past its expiry date
    Expired,
    /// Expires within 3 days
    ExpiringSoon,
    /// Expires within 7 days
    ExpiringThisWeek,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Expired => "expired",
            AlertType::ExpiringSoon => "expiring_soon",
            AlertType::ExpiringThisWeek => "expiring_this_week",
        }
    }
}

/// Ephemeral alert computed from an item's expiry date and quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpiryAlert {
    pub item_id: Uuid,
    pub item_name: String,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub quantity: i32,
    pub alert_type: AlertType,
}

/// Coarse freshness bucket shown next to items in the sale picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryStatus {
    Expired,
    Expiring,
    Fresh,
}

/// Why an item was pushed to the top of the sales list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    Expired,
    ExpiresVerySoon,
    ExpiresThisWeek,
    LowStock,
}

impl RecommendationReason {
    pub fn action(&self) -> &'static str {
        match self {
            RecommendationReason::Expired => "Remove from inventory",
            RecommendationReason::ExpiresVerySoon => "Sell immediately or discount",
            RecommendationReason::ExpiresThisWeek => "Promote for quick sale",
            RecommendationReason::LowStock => "Focus sales efforts",
        }
    }
}

/// Item suggested for prioritized selling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub days_until_expiry: Option<i64>,
    pub priority: Priority,
    pub reason: RecommendationReason,
    pub action: String,
}
