//! Fixtures shared by the backend integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gebeya_backend::config::InventoryConfig;
use gebeya_backend::services::inventory::CreateItemInput;
use gebeya_backend::services::sales::RecordSaleInput;
use gebeya_backend::store::MemoryStore;
use gebeya_backend::DynStore;
use rust_decimal::Decimal;
use uuid::Uuid;

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Fixed evaluation instant: Wednesday 2024-03-13, 08:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 13, 8, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + chrono::Duration::days(days)
}

pub fn memory_store() -> DynStore {
    Arc::new(MemoryStore::new(Duration::from_secs(5)))
}

pub fn settings() -> InventoryConfig {
    InventoryConfig::default()
}

pub fn owner() -> Uuid {
    Uuid::new_v4()
}

/// Item with cost 100, price 150 and no expiry
pub fn item_input(name: &str, quantity: i32) -> CreateItemInput {
    CreateItemInput {
        name: name.to_string(),
        description: None,
        category: None,
        barcode: None,
        sku: None,
        unit: None,
        quantity,
        cost_price: dec("100"),
        selling_price: dec("150"),
        min_threshold: None,
        max_threshold: None,
        expiry_date: None,
        batch_number: None,
        supplier: None,
        external_id: None,
    }
}

pub fn sale_input(item_id: Uuid, quantity: i32) -> RecordSaleInput {
    RecordSaleInput {
        item_id,
        quantity,
        unit_price: None,
        payment_method: None,
        customer_name: None,
        customer_phone: None,
        notes: None,
    }
}
