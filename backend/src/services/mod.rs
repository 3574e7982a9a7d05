//! Business logic services for the GebeyaNet inventory server
//!
//! Every service owns a handle to the [`Store`](crate::store::Store) and takes
//! the evaluation instant from its caller, so that one request sees one "now".

pub mod analytics;
pub mod inventory;
pub mod sales;
pub mod waste;

pub use analytics::AnalyticsService;
pub use inventory::InventoryService;
pub use sales::SaleService;
pub use waste::WasteService;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};
use shared::DateRange;

use crate::error::{AppError, AppResult};
use crate::store::SaleFilter;

/// Lift a `shared::validation` check into the error taxonomy
pub(crate) fn ensure(field: &str, check: Result<(), &'static str>) -> AppResult<()> {
    check.map_err(|message| AppError::validation(field, message))
}

/// Trim free text; blank becomes `None`
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Tell an explicit `null` (`Some(None)`) apart from an absent field (`None`).
/// Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Sales whose date falls inside `range`, end day included
pub(crate) fn sales_between(range: &DateRange) -> SaleFilter {
    SaleFilter {
        from: Some(start_of_day(range.start)),
        to: Some(start_of_day(range.end + Duration::days(1))),
        item_id: None,
    }
}
