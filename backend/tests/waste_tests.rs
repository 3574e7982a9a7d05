//! Waste management tests
//!
//! Tests for writing off expired stock including:
//! - Expired items are the removal candidates (Scenario D)
//! - Waste is logged with its own movement type
//! - Bulk removal deactivates items atomically

mod common;

use common::*;
use gebeya_backend::error::AppError;
use gebeya_backend::services::inventory::InventoryService;
use gebeya_backend::services::waste::{RemoveWasteInput, WasteService, EXPIRED_REMOVAL_NOTE};
use gebeya_backend::store::MovementFilter;
use gebeya_backend::DynStore;
use shared::{generate_alerts, AlertType, MovementType, Priority};
use uuid::Uuid;

struct Shelf {
    store: DynStore,
    owner_id: Uuid,
    inventory: InventoryService,
    waste: WasteService,
}

impl Shelf {
    fn new() -> Self {
        let store = memory_store();
        Self {
            store: store.clone(),
            owner_id: owner(),
            inventory: InventoryService::new(store.clone(), settings()),
            waste: WasteService::new(store),
        }
    }

    async fn stock(&self, name: &str, quantity: i32, expires_in: Option<i64>) -> Uuid {
        let mut input = item_input(name, quantity);
        input.expiry_date = expires_in.map(days_from_today);
        self.inventory
            .add_item(self.owner_id, input, now())
            .await
            .unwrap()
            .item
            .id
    }
}

fn remove(quantity: i32) -> RemoveWasteInput {
    RemoveWasteInput {
        quantity,
        note: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Scenario D
    #[tokio::test]
    async fn test_expired_item_is_flagged_everywhere() {
        let shelf = Shelf::new();
        let item_id = shelf.stock("Yogurt", 4, Some(-1)).await;

        let view = shelf
            .inventory
            .get_item(shelf.owner_id, item_id, now())
            .await
            .unwrap()
            .item;
        assert!(view.is_expired);
        assert_eq!(view.days_until_expiry, Some(-1));
        assert_eq!(view.priority, Priority::High);

        let items = shelf.inventory.active_items(shelf.owner_id).await.unwrap();
        let alerts = generate_alerts(&items, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Expired);

        let summary = shelf.waste.waste_summary(shelf.owner_id, now()).await.unwrap();
        assert_eq!(summary.expired_items, 1);
        assert_eq!(summary.items[0].item_id, item_id);
    }

    #[tokio::test]
    async fn test_partial_removal_logs_waste_movement() {
        let shelf = Shelf::new();
        let item_id = shelf.stock("Cheese", 10, Some(-3)).await;

        let view = shelf
            .waste
            .remove_partial_quantity(shelf.owner_id, item_id, remove(4), now())
            .await
            .unwrap();

        assert_eq!(view.item.quantity, 6);
        let movements = shelf.inventory.movements(shelf.owner_id, item_id).await.unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Waste);
        assert_eq!(movements[0].quantity_change, -4);
    }

    #[tokio::test]
    async fn test_partial_removal_clamped_to_stock() {
        let shelf = Shelf::new();
        let item_id = shelf.stock("Milk", 3, Some(-1)).await;

        let view = shelf
            .waste
            .remove_partial_quantity(shelf.owner_id, item_id, remove(10), now())
            .await
            .unwrap();

        assert_eq!(view.item.quantity, 0);
        let movements = shelf.inventory.movements(shelf.owner_id, item_id).await.unwrap();
        assert_eq!(movements[0].quantity_change, -3);
    }

    #[tokio::test]
    async fn test_fresh_item_cannot_be_wasted() {
        let shelf = Shelf::new();
        let dated = shelf.stock("Honey", 5, Some(30)).await;
        let undated = shelf.stock("Salt", 5, None).await;

        for item_id in [dated, undated] {
            let err = shelf
                .waste
                .remove_partial_quantity(shelf.owner_id, item_id, remove(1), now())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
    }

    #[tokio::test]
    async fn test_remove_all_expired() {
        let shelf = Shelf::new();
        let old = shelf.stock("Old bread", 4, Some(-2)).await;
        let empty = shelf.stock("Old milk", 0, Some(-1)).await;
        let today = shelf.stock("Today", 7, Some(0)).await;
        let fresh = shelf.stock("Fresh", 9, Some(10)).await;

        let removal = shelf.waste.remove_all_expired(shelf.owner_id, now()).await.unwrap();

        assert_eq!(removal.items_removed, 2);
        assert_eq!(removal.quantity_removed, 4);
        assert_eq!(removal.value_removed, dec("400"));
        assert!(removal.item_ids.contains(&old));
        assert!(removal.item_ids.contains(&empty));

        let active: Vec<Uuid> = shelf
            .inventory
            .active_items(shelf.owner_id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(active.len(), 2);
        assert!(active.contains(&today));
        assert!(active.contains(&fresh));

        let after = shelf.waste.waste_summary(shelf.owner_id, now()).await.unwrap();
        assert_eq!(after.expired_items, 0);
        assert_eq!(after.waste_value, dec("0"));
        assert_eq!(after.recorded_waste_quantity, 4);
    }

    #[tokio::test]
    async fn test_remove_all_expired_logs_note() {
        let shelf = Shelf::new();
        shelf.stock("Old bread", 4, Some(-2)).await;

        let removal = shelf.waste.remove_all_expired(shelf.owner_id, now()).await.unwrap();
        assert_eq!(removal.items_removed, 1);

        let movements = shelf
            .store
            .list_movements(shelf.owner_id, &MovementFilter::of_type(MovementType::Waste))
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].previous_quantity, 4);
        assert_eq!(movements[0].new_quantity, 0);
        assert_eq!(movements[0].note.as_deref(), Some(EXPIRED_REMOVAL_NOTE));
    }

    #[tokio::test]
    async fn test_remove_all_expired_with_nothing_expired() {
        let shelf = Shelf::new();
        shelf.stock("Fresh", 9, Some(10)).await;

        let removal = shelf.waste.remove_all_expired(shelf.owner_id, now()).await.unwrap();
        assert_eq!(removal.items_removed, 0);
        assert!(removal.item_ids.is_empty());
    }

    #[tokio::test]
    async fn test_waste_summary_values() {
        let shelf = Shelf::new();
        shelf.stock("Expired a", 2, Some(-5)).await;
        shelf.stock("Expired b", 3, Some(-1)).await;
        shelf.stock("Fresh", 100, Some(5)).await;

        let summary = shelf.waste.waste_summary(shelf.owner_id, now()).await.unwrap();
        assert_eq!(summary.expired_items, 2);
        assert_eq!(summary.expired_quantity, 5);
        assert_eq!(summary.waste_value, dec("500"));
        assert_eq!(summary.recorded_waste_quantity, 0);
        // longest expired first
        assert_eq!(summary.items[0].item_name, "Expired a");
        assert_eq!(summary.items[0].days_until_expiry, -5);
    }
}
