//! Shared types and domain logic for the GebeyaNet inventory platform
//!
//! This crate holds everything that must behave identically on the server and
//! in the browser (via WASM): the data model, expiry arithmetic, urgency
//! ordering, alert generation and analytics rollups. It performs no I/O.

pub mod alerts;
pub mod analytics;
pub mod expiry;
pub mod models;
pub mod priority;
pub mod types;
pub mod validation;

pub use alerts::{classify, generate_alerts, AlertCounts};
pub use expiry::{
    days_until_expiry, expiry_status, expiry_status_text, is_expired, priority_for_days,
    priority_of, Perishable,
};
pub use models::*;
pub use priority::{recommendations, sort_by_priority};
pub use types::*;
pub use validation::*;
