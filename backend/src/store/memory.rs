//! In-process store used by tests and by `store.backend = "memory"`
//!
//! A single mutex guards all state, so every transaction is serializable. A
//! transaction works on a copy and swaps it in on commit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::{InventoryItem, Sale, SaleDetail, StockMovement};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ConflictField, MovementFilter, SaleFilter, Store, StoreTx};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: HashMap<Uuid, InventoryItem>,
    /// Append-only, oldest first
    movements: Vec<StockMovement>,
    sales: HashMap<Uuid, Sale>,
}

impl MemoryState {
    fn owned_item(&self, owner_id: Uuid, item_id: Uuid) -> Option<&InventoryItem> {
        self.items
            .get(&item_id)
            .filter(|item| item.owner_id == owner_id)
    }

    fn active_items(&self, owner_id: Uuid, include_inactive: bool) -> Vec<InventoryItem> {
        let mut items: Vec<InventoryItem> = self
            .items
            .values()
            .filter(|item| item.owner_id == owner_id && (include_inactive || item.is_active))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        items
    }

    fn sale_detail(&self, sale: &Sale) -> SaleDetail {
        let item = self.items.get(&sale.item_id);
        SaleDetail {
            sale: sale.clone(),
            item_name: item.map(|i| i.name.clone()).unwrap_or_default(),
            item_unit: item.map(|i| i.unit.clone()).unwrap_or_default(),
            category: item.and_then(|i| i.category.clone()),
        }
    }
}

/// Mutex-guarded in-memory store
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    lock_timeout: Duration,
}

impl MemoryStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_timeout,
        }
    }

    async fn acquire(&self) -> AppResult<OwnedMutexGuard<MemoryState>> {
        tokio::time::timeout(self.lock_timeout, self.state.clone().lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    retryable = true,
                    "Timed out waiting for inventory lock"
                );
                AppError::Concurrency("Timed out waiting for inventory lock".to_string())
            })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.acquire().await?;
        let working = MemoryState::clone(&guard);
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn list_items(
        &self,
        owner_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<Vec<InventoryItem>> {
        let state = self.acquire().await?;
        Ok(state.active_items(owner_id, include_inactive))
    }

    async fn find_item(&self, owner_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let state = self.acquire().await?;
        Ok(state
            .owned_item(owner_id, item_id)
            .filter(|item| item.is_active)
            .cloned())
    }

    async fn list_movements(
        &self,
        owner_id: Uuid,
        filter: &MovementFilter,
    ) -> AppResult<Vec<StockMovement>> {
        let state = self.acquire().await?;
        let mut movements: Vec<StockMovement> = state
            .movements
            .iter()
            .rev()
            .filter(|m| m.owner_id == owner_id)
            .filter(|m| filter.item_id.map_or(true, |id| m.item_id == id))
            .filter(|m| filter.movement_type.map_or(true, |t| m.movement_type == t))
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-inserted first
        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            movements.truncate(limit.max(0) as usize);
        }
        Ok(movements)
    }

    async fn find_sale(&self, owner_id: Uuid, sale_id: Uuid) -> AppResult<Option<SaleDetail>> {
        let state = self.acquire().await?;
        Ok(state
            .sales
            .get(&sale_id)
            .filter(|sale| sale.owner_id == owner_id)
            .map(|sale| state.sale_detail(sale)))
    }

    async fn list_sales(&self, owner_id: Uuid, filter: &SaleFilter) -> AppResult<Vec<SaleDetail>> {
        let state = self.acquire().await?;
        let mut sales: Vec<&Sale> = state
            .sales
            .values()
            .filter(|sale| sale.owner_id == owner_id && filter.matches(sale))
            .collect();
        sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date).then_with(|| a.id.cmp(&b.id)));
        Ok(sales.into_iter().map(|sale| state.sale_detail(sale)).collect())
    }

    async fn ping(&self) -> AppResult<()> {
        self.acquire().await.map(|_| ())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_item(&mut self, owner_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        Ok(self
            .working
            .owned_item(owner_id, item_id)
            .filter(|item| item.is_active)
            .cloned())
    }

    async fn lock_active_items(&mut self, owner_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        Ok(self.working.active_items(owner_id, false))
    }

    async fn find_conflict(
        &mut self,
        owner_id: Uuid,
        name: &str,
        barcode: Option<&str>,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<ConflictField>> {
        let name = name.to_lowercase();
        let barcode = barcode.filter(|b| !b.is_empty());
        let others = self.working.items.values().filter(|item| {
            item.owner_id == owner_id && item.is_active && Some(item.id) != exclude
        });

        let mut conflict = None;
        for item in others {
            if item.name.to_lowercase() == name {
                return Ok(Some(ConflictField::Name));
            }
            if barcode.is_some() && item.barcode.as_deref() == barcode {
                conflict = Some(ConflictField::Barcode);
            }
        }
        Ok(conflict)
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        self.working.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        match self.working.items.get_mut(&item.id) {
            Some(stored) if stored.owner_id == item.owner_id => {
                *stored = item.clone();
                Ok(())
            }
            _ => Err(AppError::NotFound("Inventory item".to_string())),
        }
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()> {
        self.working.movements.push(movement.clone());
        Ok(())
    }

    async fn lock_sale(&mut self, owner_id: Uuid, sale_id: Uuid) -> AppResult<Option<Sale>> {
        Ok(self
            .working
            .sales
            .get(&sale_id)
            .filter(|sale| sale.owner_id == owner_id)
            .cloned())
    }

    async fn insert_sale(&mut self, sale: &Sale) -> AppResult<()> {
        self.working.sales.insert(sale.id, sale.clone());
        Ok(())
    }

    async fn update_sale(&mut self, sale: &Sale) -> AppResult<()> {
        match self.working.sales.get_mut(&sale.id) {
            Some(stored) if stored.owner_id == sale.owner_id => {
                *stored = sale.clone();
                Ok(())
            }
            _ => Err(AppError::NotFound("Sale".to_string())),
        }
    }

    async fn delete_sale(&mut self, owner_id: Uuid, sale_id: Uuid) -> AppResult<()> {
        let owned = self
            .working
            .sales
            .get(&sale_id)
            .is_some_and(|sale| sale.owner_id == owner_id);
        if !owned {
            return Err(AppError::NotFound("Sale".to_string()));
        }
        self.working.sales.remove(&sale_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
