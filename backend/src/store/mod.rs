//! Persistence boundary for the inventory engine
//!
//! Services never talk to a database directly. They open a [`StoreTx`] for
//! anything that mutates state, lock the rows they touch, and commit once.
//! Dropping a transaction without committing discards every write made
//! through it.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{InventoryItem, MovementType, Sale, SaleDetail, StockMovement};
use uuid::Uuid;

use crate::error::AppResult;

/// Field that collided with an existing active item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Name,
    Barcode,
}

impl ConflictField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictField::Name => "name",
            ConflictField::Barcode => "barcode",
        }
    }
}

/// Which movements to read; newest first
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub item_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub limit: Option<i64>,
}

impl MovementFilter {
    pub fn for_item(item_id: Uuid) -> Self {
        Self {
            item_id: Some(item_id),
            ..Self::default()
        }
    }

    pub fn of_type(movement_type: MovementType) -> Self {
        Self {
            movement_type: Some(movement_type),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Which sales to read; newest first. `to` is exclusive.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub item_id: Option<Uuid>,
}

impl SaleFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        self.from.map_or(true, |from| sale.sale_date >= from)
            && self.to.map_or(true, |to| sale.sale_date < to)
            && self.item_id.map_or(true, |id| sale.item_id == id)
    }
}

/// Read access plus the entry point for atomic writes
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    /// Active items, newest first. `include_inactive` also returns deleted and
    /// wasted-out items, which sale history may still reference.
    async fn list_items(&self, owner_id: Uuid, include_inactive: bool)
        -> AppResult<Vec<InventoryItem>>;

    /// An active item
    async fn find_item(&self, owner_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>>;

    async fn list_movements(
        &self,
        owner_id: Uuid,
        filter: &MovementFilter,
    ) -> AppResult<Vec<StockMovement>>;

    async fn find_sale(&self, owner_id: Uuid, sale_id: Uuid) -> AppResult<Option<SaleDetail>>;

    async fn list_sales(&self, owner_id: Uuid, filter: &SaleFilter) -> AppResult<Vec<SaleDetail>>;

    async fn ping(&self) -> AppResult<()>;
}

/// One atomic unit of work. Reads through a transaction lock what they return
/// until commit or drop.
#[async_trait]
pub trait StoreTx: Send {
    /// Lock an active item for update
    async fn lock_item(&mut self, owner_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>>;

    /// Lock every active item of an owner, newest first
    async fn lock_active_items(&mut self, owner_id: Uuid) -> AppResult<Vec<InventoryItem>>;

    /// First active item (other than `exclude`) sharing the name
    /// (case-insensitive) or barcode
    async fn find_conflict(
        &mut self,
        owner_id: Uuid,
        name: &str,
        barcode: Option<&str>,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<ConflictField>>;

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()>;

    async fn update_item(&mut self, item: &InventoryItem) -> AppResult<()>;

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()>;

    async fn lock_sale(&mut self, owner_id: Uuid, sale_id: Uuid) -> AppResult<Option<Sale>>;

    async fn insert_sale(&mut self, sale: &Sale) -> AppResult<()>;

    async fn update_sale(&mut self, sale: &Sale) -> AppResult<()>;

    async fn delete_sale(&mut self, owner_id: Uuid, sale_id: Uuid) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

pub type DynStore = Arc<dyn Store>;
