//! Sale reconciliation: every sale, reversal and metadata edit is one atomic
//! unit against the item it touches

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::analytics::SalesTotals;
use shared::{
    validation, MovementType, PaymentMethod, Sale, SaleAmounts, SaleDetail, StockMovement,
};
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure, start_of_day};
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, SaleFilter};

pub const SALE_REVERSAL_NOTE: &str = "Sale reversal";

/// Sale service for recording and reversing sales
#[derive(Clone)]
pub struct SaleService {
    store: DynStore,
}

/// Input for recording a sale
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordSaleInput {
    pub item_id: Uuid,
    pub quantity: i32,
    /// Defaults to the item's current selling price
    pub unit_price: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = 255, message = "Customer name must not exceed 255 characters"))]
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[validate(length(max = 1000, message = "Notes must not exceed 1000 characters"))]
    pub notes: Option<String>,
}

/// Post-hoc edit of customer-facing sale metadata. Quantity, prices and totals
/// cannot be changed once recorded.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSaleInput {
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = 255, message = "Customer name must not exceed 255 characters"))]
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[validate(length(max = 1000, message = "Notes must not exceed 1000 characters"))]
    pub notes: Option<String>,
}

impl UpdateSaleInput {
    fn is_empty(&self) -> bool {
        self.payment_method.is_none()
            && self.customer_name.is_none()
            && self.customer_phone.is_none()
            && self.notes.is_none()
    }
}

/// Sale list filter; both dates are inclusive calendar days
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub item_id: Option<Uuid>,
}

impl SaleQuery {
    fn filter(&self) -> SaleFilter {
        SaleFilter {
            from: self.from.map(start_of_day),
            to: self.to.map(|date| start_of_day(date + Duration::days(1))),
            item_id: self.item_id,
        }
    }
}

/// Sales with their totals
#[derive(Debug, Clone, Serialize)]
pub struct SaleList {
    pub sales: Vec<SaleDetail>,
    pub summary: SalesTotals,
}

fn check_phone(phone: Option<&str>) -> AppResult<()> {
    match phone.filter(|p| !p.is_empty()) {
        Some(phone) => ensure("customer_phone", validation::validate_ethiopian_phone(phone)),
        None => Ok(()),
    }
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// Record a sale: check stock under the item lock, snapshot the cost
    /// price, then write the sale, the decrement and the movement together.
    pub async fn record_sale(
        &self,
        owner_id: Uuid,
        input: RecordSaleInput,
        now: DateTime<Utc>,
    ) -> AppResult<SaleDetail> {
        input.validate()?;
        ensure("quantity", validation::validate_sale_quantity(input.quantity))?;
        if let Some(unit_price) = input.unit_price {
            ensure("unit_price", validation::validate_unit_price(unit_price))?;
        }
        check_phone(input.customer_phone.as_deref())?;

        let mut tx = self.store.begin().await?;
        let mut item = tx
            .lock_item(owner_id, input.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        if input.quantity > item.quantity {
            tracing::warn!(
                owner_id = %owner_id,
                item_id = %item.id,
                available = item.quantity,
                requested = input.quantity,
                "Sale rejected: insufficient stock"
            );
            return Err(AppError::InsufficientStock {
                item_id: item.id,
                available: item.quantity,
                requested: input.quantity,
            });
        }

        let unit_price = input
            .unit_price
            .map(validation::to_money)
            .unwrap_or(item.selling_price);
        let amounts = SaleAmounts::compute(input.quantity, unit_price, item.cost_price)
            .map_err(|message| AppError::validation("quantity", message))?;
        let sale = Sale {
            id: Uuid::new_v4(),
            owner_id,
            item_id: item.id,
            quantity: input.quantity,
            unit_price,
            cost_price: item.cost_price,
            total_amount: amounts.total_amount,
            profit_amount: amounts.profit_amount,
            payment_method: input.payment_method.unwrap_or_default(),
            customer_name: clean(input.customer_name),
            customer_phone: clean(input.customer_phone),
            notes: clean(input.notes),
            sale_date: now,
        };
        tx.insert_sale(&sale).await?;

        let previous = item.quantity;
        item.quantity -= sale.quantity;
        item.updated_at = now;
        tx.update_item(&item).await?;

        let movement = StockMovement::record(
            owner_id,
            item.id,
            MovementType::Sale,
            previous,
            item.quantity,
            now,
        )
        .with_sale(sale.id);
        tx.insert_movement(&movement).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            sale_id = %sale.id,
            item_id = %item.id,
            quantity = sale.quantity,
            total = %sale.total_amount,
            "Sale recorded"
        );

        Ok(SaleDetail {
            sale,
            item_name: item.name,
            item_unit: item.unit,
            category: item.category,
        })
    }

    /// Undo a sale: restore stock, log a return movement and delete the sale.
    /// Rejected as a whole when the item is no longer active.
    pub async fn reverse_sale(&self, owner_id: Uuid, sale_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let sale = tx
            .lock_sale(owner_id, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
        let mut item = tx
            .lock_item(owner_id, sale.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let previous = item.quantity;
        item.quantity = previous.saturating_add(sale.quantity);
        item.updated_at = now;
        tx.update_item(&item).await?;

        let movement = StockMovement::record(
            owner_id,
            item.id,
            MovementType::Return,
            previous,
            item.quantity,
            now,
        )
        .with_sale(sale.id)
        .with_note(SALE_REVERSAL_NOTE);
        tx.insert_movement(&movement).await?;
        tx.delete_sale(owner_id, sale.id).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            sale_id = %sale_id,
            item_id = %item.id,
            quantity = sale.quantity,
            "Sale reversed"
        );
        Ok(())
    }

    /// Change customer-facing metadata of a recorded sale
    pub async fn update_sale(
        &self,
        owner_id: Uuid,
        sale_id: Uuid,
        input: UpdateSaleInput,
    ) -> AppResult<SaleDetail> {
        input.validate()?;
        if input.is_empty() {
            return Err(AppError::validation("sale", "No fields to update"));
        }
        check_phone(input.customer_phone.as_deref())?;

        let mut tx = self.store.begin().await?;
        let mut sale = tx
            .lock_sale(owner_id, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        if let Some(payment_method) = input.payment_method {
            sale.payment_method = payment_method;
        }
        if input.customer_name.is_some() {
            sale.customer_name = clean(input.customer_name);
        }
        if input.customer_phone.is_some() {
            sale.customer_phone = clean(input.customer_phone);
        }
        if input.notes.is_some() {
            sale.notes = clean(input.notes);
        }
        tx.update_sale(&sale).await?;
        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, sale_id = %sale_id, "Sale metadata updated");
        self.get_sale(owner_id, sale_id).await
    }

    pub async fn get_sale(&self, owner_id: Uuid, sale_id: Uuid) -> AppResult<SaleDetail> {
        self.store
            .find_sale(owner_id, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// Sales matching the query, newest first, with their totals
    pub async fn list_sales(&self, owner_id: Uuid, query: &SaleQuery) -> AppResult<SaleList> {
        let sales = self.store.list_sales(owner_id, &query.filter()).await?;
        let summary = SalesTotals::from_sales(sales.iter().map(|detail| &detail.sale));
        Ok(SaleList { sales, summary })
    }
}
