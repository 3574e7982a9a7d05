//! WebAssembly module for the Gebeya dashboard
//!
//! Provides client-side computation for:
//! - Days until expiry and priority tiers
//! - Priority ordering of item lists
//! - Expiry alerts and sales recommendations
//!
//! The functions take JSON item lists as the dashboard holds them, so the
//! browser orders and flags items exactly the way the server does.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use shared::{expiry, Perishable, DEFAULT_MIN_THRESHOLD};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

/// An item from the dashboard, kept verbatim so sorting hands back exactly
/// what it was given
struct DashboardItem {
    id: Uuid,
    name: String,
    quantity: i32,
    expiry_date: Option<NaiveDate>,
    min_threshold: i32,
    raw: Value,
}

#[derive(Deserialize)]
struct ItemFields {
    id: Uuid,
    name: String,
    #[serde(default)]
    quantity: i32,
    #[serde(default, alias = "expiryDate")]
    expiry_date: Option<NaiveDate>,
    #[serde(default, alias = "minThreshold")]
    min_threshold: Option<i32>,
}

impl Perishable for DashboardItem {
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

fn parse_items(items_json: &str) -> Result<Vec<DashboardItem>, String> {
    let raw: Vec<Value> =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            let fields = ItemFields::deserialize(&value)
                .map_err(|e| format!("Invalid item at index {}: {}", index, e))?;
            Ok(DashboardItem {
                id: fields.id,
                name: fields.name,
                quantity: fields.quantity,
                expiry_date: fields.expiry_date,
                min_threshold: fields.min_threshold.unwrap_or(DEFAULT_MIN_THRESHOLD),
                raw: value,
            })
        })
        .collect()
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    // accept full timestamps as well as plain dates
    let day = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("Invalid date '{}': {}", date, e))
}

fn instant(now_millis: f64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(now_millis as i64)
        .ok_or_else(|| format!("Invalid timestamp: {}", now_millis))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn clamp_days(days: i64) -> i32 {
    days.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Whole days until `expiry_date` (YYYY-MM-DD), negative once expired
#[wasm_bindgen]
pub fn days_until_expiry(expiry_date: &str, now_millis: f64) -> Result<i32, JsValue> {
    let date = parse_date(expiry_date).map_err(js_error)?;
    let now = instant(now_millis).map_err(js_error)?;
    Ok(clamp_days(expiry::days_until_expiry(date, now)))
}

/// Days until expiry measured against the browser clock
#[wasm_bindgen]
pub fn days_until_expiry_now(expiry_date: &str) -> Result<i32, JsValue> {
    days_until_expiry(expiry_date, js_sys::Date::now())
}

/// "high", "medium" or "low"; undated items are always low
#[wasm_bindgen]
pub fn item_priority(expiry_date: Option<String>, now_millis: f64) -> Result<String, JsValue> {
    let now = instant(now_millis).map_err(js_error)?;
    let days = match expiry_date {
        Some(date) => Some(expiry::days_until_expiry(parse_date(&date).map_err(js_error)?, now)),
        None => None,
    };
    Ok(expiry::priority_for_days(days).as_str().to_string())
}

/// Reorder items most urgent first; each item is returned unchanged
#[wasm_bindgen]
pub fn sort_items_by_priority(items_json: &str, now_millis: f64) -> Result<String, JsValue> {
    let items = parse_items(items_json).map_err(js_error)?;
    let now = instant(now_millis).map_err(js_error)?;

    let sorted: Vec<Value> = shared::sort_by_priority(items, now)
        .into_iter()
        .map(|item| item.raw)
        .collect();
    to_json(&sorted).map_err(js_error)
}

/// Expiry alerts for in-stock items, most urgent first
#[wasm_bindgen]
pub fn generate_expiry_alerts(items_json: &str, now_millis: f64) -> Result<String, JsValue> {
    let items = parse_items(items_json).map_err(js_error)?;
    let now = instant(now_millis).map_err(js_error)?;
    to_json(&shared::generate_alerts(&items, now)).map_err(js_error)
}

/// Items worth promoting at the counter
#[wasm_bindgen]
pub fn sales_recommendations(
    items_json: &str,
    now_millis: f64,
    limit: usize,
) -> Result<String, JsValue> {
    let items = parse_items(items_json).map_err(js_error)?;
    let now = instant(now_millis).map_err(js_error)?;
    to_json(&shared::recommendations(&items, now, limit)).map_err(js_error)
}

/// Label such as "Expires tomorrow" or "Expired 3 days ago"
#[wasm_bindgen]
pub fn expiry_status_text(days: i32) -> String {
    expiry::expiry_status_text(i64::from(days))
}
