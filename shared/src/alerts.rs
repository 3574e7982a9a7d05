//! Expiry alert generation
//!
//! Alerts are recomputed from current item state on every call; nothing is
//! cached or persisted.

use chrono::{DateTime, Utc};

use crate::expiry::{days_until_expiry, Perishable, SOON_DAYS, WEEK_DAYS};
use crate::models::{AlertType, ExpiryAlert};

/// Classify days until expiry; `None` means no alert is due
pub fn classify(days: i64) -> Option<AlertType> {
    if days < 0 {
        Some(AlertType::Expired)
    } else if days <= SOON_DAYS {
        Some(AlertType::ExpiringSoon)
    } else if days <= WEEK_DAYS {
        Some(AlertType::ExpiringThisWeek)
    } else {
        None
    }
}

/// Alerts for every in-stock dated item expiring within a week, most urgent first
pub fn generate_alerts<T: Perishable>(items: &[T], now: DateTime<Utc>) -> Vec<ExpiryAlert> {
    let mut alerts: Vec<ExpiryAlert> = items
        .iter()
        .filter(|item| item.quantity() > 0)
        .filter_map(|item| {
            let expiry_date = item.expiry_date()?;
            let days = days_until_expiry(expiry_date, now);
            let alert_type = classify(days)?;
            Some(ExpiryAlert {
                item_id: item.item_id(),
                item_name: item.item_name().to_string(),
                expiry_date,
                days_until_expiry: days,
                quantity: item.quantity(),
                alert_type,
            })
        })
        .collect();

    alerts.sort_by_key(|alert| alert.days_until_expiry);
    alerts
}

/// Alert counts per type, for the dashboard badges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AlertCounts {
    pub expired: usize,
    pub expiring_soon: usize,
    pub expiring_this_week: usize,
}

impl AlertCounts {
    pub fn tally(alerts: &[ExpiryAlert]) -> Self {
        alerts.iter().fold(Self::default(), |mut counts, alert| {
            match alert.alert_type {
                AlertType::Expired => counts.expired += 1,
                AlertType::ExpiringSoon => counts.expiring_soon += 1,
                AlertType::ExpiringThisWeek => counts.expiring_this_week += 1,
            }
            counts
        })
    }
}
