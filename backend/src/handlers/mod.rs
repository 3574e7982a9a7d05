//! HTTP handlers
//!
//! Handlers stay thin: extract, build the service from shared state, call it
//! with the current time, wrap the result in JSON.

pub mod alerts;
pub mod analytics;
pub mod health;
pub mod items;
pub mod sales;
pub mod waste;

pub use alerts::*;
pub use analytics::*;
pub use health::*;
pub use items::*;
pub use sales::*;
pub use waste::*;
