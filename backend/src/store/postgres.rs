//! PostgreSQL store
//!
//! Mutations run inside one database transaction with `SELECT ... FOR UPDATE`
//! on every row they read and a session-local `lock_timeout`, so contention
//! surfaces as a retryable [`AppError::Concurrency`] instead of a hang.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{InventoryItem, MovementType, PaymentMethod, Sale, SaleDetail, StockMovement};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{ConflictField, MovementFilter, SaleFilter, Store, StoreTx};
use crate::error::{AppError, AppResult};

const ITEM_COLUMNS: &str = "id, owner_id, external_id, name, description, category, barcode, \
     sku, unit, quantity, cost_price, selling_price, min_threshold, max_threshold, expiry_date, \
     batch_number, supplier, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, owner_id, item_id, movement_type, quantity_change, \
     previous_quantity, new_quantity, reference_sale_id, note, created_at";

const SALE_COLUMNS: &str = "id, owner_id, item_id, quantity, unit_price, cost_price, \
     total_amount, profit_amount, payment_method, customer_name, customer_phone, notes, sale_date";

/// Row for inventory item queries
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    owner_id: Uuid,
    external_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    category: Option<String>,
    barcode: Option<String>,
    sku: Option<String>,
    unit: String,
    quantity: i32,
    cost_price: Decimal,
    selling_price: Decimal,
    min_threshold: i32,
    max_threshold: Option<i32>,
    expiry_date: Option<NaiveDate>,
    batch_number: Option<String>,
    supplier: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.id,
            owner_id: row.owner_id,
            external_id: row.external_id,
            name: row.name,
            description: row.description,
            category: row.category,
            barcode: row.barcode,
            sku: row.sku,
            unit: row.unit,
            quantity: row.quantity,
            cost_price: row.cost_price,
            selling_price: row.selling_price,
            min_threshold: row.min_threshold,
            max_threshold: row.max_threshold,
            expiry_date: row.expiry_date,
            batch_number: row.batch_number,
            supplier: row.supplier,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row for stock movement queries
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    owner_id: Uuid,
    item_id: Uuid,
    movement_type: String,
    quantity_change: i32,
    previous_quantity: i32,
    new_quantity: i32,
    reference_sale_id: Option<Uuid>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: row.id,
            owner_id: row.owner_id,
            item_id: row.item_id,
            movement_type: row
                .movement_type
                .parse::<MovementType>()
                .map_err(|e| AppError::Internal(e.to_string()))?,
            quantity_change: row.quantity_change,
            previous_quantity: row.previous_quantity,
            new_quantity: row.new_quantity,
            reference_sale_id: row.reference_sale_id,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

/// Row for sale queries
#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    owner_id: Uuid,
    item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    cost_price: Decimal,
    total_amount: Decimal,
    profit_amount: Decimal,
    payment_method: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    notes: Option<String>,
    sale_date: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            id: row.id,
            owner_id: row.owner_id,
            item_id: row.item_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            cost_price: row.cost_price,
            total_amount: row.total_amount,
            profit_amount: row.profit_amount,
            payment_method: row
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| AppError::Internal(e.to_string()))?,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            notes: row.notes,
            sale_date: row.sale_date,
        })
    }
}

/// Row for sale queries joined with the item's display fields
#[derive(Debug, FromRow)]
struct SaleDetailRow {
    #[sqlx(flatten)]
    sale: SaleRow,
    item_name: String,
    item_unit: String,
    category: Option<String>,
}

impl TryFrom<SaleDetailRow> for SaleDetail {
    type Error = AppError;

    fn try_from(row: SaleDetailRow) -> Result<Self, Self::Error> {
        Ok(SaleDetail {
            sale: row.sale.try_into()?,
            item_name: row.item_name,
            item_unit: row.item_unit,
            category: row.category,
        })
    }
}

/// Map lock contention and unique violations onto the domain taxonomy
fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // lock_not_available, serialization_failure, deadlock_detected
            Some("55P03") | Some("40001") | Some("40P01") => {
                tracing::warn!(retryable = true, "Lock contention: {}", db_err.message());
                return AppError::Concurrency(
                    "Item is being updated by another request".to_string(),
                );
            }
            Some("23505") => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("barcode") => ConflictField::Barcode,
                    _ => ConflictField::Name,
                };
                return AppError::conflict(
                    field.as_str(),
                    format!("An item with this {} already exists", field.as_str()),
                );
            }
            _ => {}
        }
    }
    AppError::DatabaseError(err)
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(db: PgPool, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let mut tx = self.db.begin().await.map_err(map_db_error)?;

        // SET does not take bind parameters; the value is a plain integer
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        Ok(Box::new(PgTx { tx }))
    }

    async fn list_items(
        &self,
        owner_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE owner_id = $1 AND ($2 OR is_active)
            ORDER BY created_at DESC, name
            "#
        ))
        .bind(owner_id)
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_item(&self, owner_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 AND owner_id = $2 AND is_active"
        ))
        .bind(item_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_movements(
        &self,
        owner_id: Uuid,
        filter: &MovementFilter,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE owner_id = $1
              AND ($2::uuid IS NULL OR item_id = $2)
              AND ($3::text IS NULL OR movement_type = $3)
            ORDER BY created_at DESC, seq DESC
            LIMIT $4
            "#
        ))
        .bind(owner_id)
        .bind(filter.item_id)
        .bind(filter.movement_type.map(|t| t.as_str()))
        .bind(filter.limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_sale(&self, owner_id: Uuid, sale_id: Uuid) -> AppResult<Option<SaleDetail>> {
        let row = sqlx::query_as::<_, SaleDetailRow>(
            r#"
            SELECT s.id, s.owner_id, s.item_id, s.quantity, s.unit_price, s.cost_price,
                   s.total_amount, s.profit_amount, s.payment_method, s.customer_name,
                   s.customer_phone, s.notes, s.sale_date,
                   i.name AS item_name, i.unit AS item_unit, i.category
            FROM sales s
            JOIN inventory_items i ON i.id = s.item_id
            WHERE s.id = $1 AND s.owner_id = $2
            "#,
        )
        .bind(sale_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_sales(&self, owner_id: Uuid, filter: &SaleFilter) -> AppResult<Vec<SaleDetail>> {
        let rows = sqlx::query_as::<_, SaleDetailRow>(
            r#"
            SELECT s.id, s.owner_id, s.item_id, s.quantity, s.unit_price, s.cost_price,
                   s.total_amount, s.profit_amount, s.payment_method, s.customer_name,
                   s.customer_phone, s.notes, s.sale_date,
                   i.name AS item_name, i.unit AS item_unit, i.category
            FROM sales s
            JOIN inventory_items i ON i.id = s.item_id
            WHERE s.owner_id = $1
              AND ($2::timestamptz IS NULL OR s.sale_date >= $2)
              AND ($3::timestamptz IS NULL OR s.sale_date < $3)
              AND ($4::uuid IS NULL OR s.item_id = $4)
            ORDER BY s.sale_date DESC, s.id
            "#,
        )
        .bind(owner_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_item(&mut self, owner_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE id = $1 AND owner_id = $2 AND is_active
            FOR UPDATE
            "#
        ))
        .bind(item_id)
        .bind(owner_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Into::into))
    }

    async fn lock_active_items(&mut self, owner_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE owner_id = $1 AND is_active
            ORDER BY created_at DESC, name
            FOR UPDATE
            "#
        ))
        .bind(owner_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_conflict(
        &mut self,
        owner_id: Uuid,
        name: &str,
        barcode: Option<&str>,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<ConflictField>> {
        let barcode = barcode.filter(|b| !b.is_empty());
        let name_clash = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT lower(name) = lower($2)
            FROM inventory_items
            WHERE owner_id = $1
              AND is_active
              AND ($4::uuid IS NULL OR id <> $4)
              AND (lower(name) = lower($2) OR ($3::text IS NOT NULL AND barcode = $3))
            ORDER BY 1 DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(barcode)
        .bind(exclude)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(name_clash.map(|is_name| {
            if is_name {
                ConflictField::Name
            } else {
                ConflictField::Barcode
            }
        }))
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO inventory_items ({ITEM_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#
        ))
        .bind(item.id)
        .bind(item.owner_id)
        .bind(item.external_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.barcode)
        .bind(&item.sku)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.cost_price)
        .bind(item.selling_price)
        .bind(item.min_threshold)
        .bind(item.max_threshold)
        .bind(item.expiry_date)
        .bind(&item.batch_number)
        .bind(&item.supplier)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn update_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = $3, description = $4, category = $5, barcode = $6, sku = $7,
                unit = $8, quantity = $9, cost_price = $10, selling_price = $11,
                min_threshold = $12, max_threshold = $13, expiry_date = $14,
                batch_number = $15, supplier = $16, is_active = $17, updated_at = $18
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(item.id)
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.barcode)
        .bind(&item.sku)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.cost_price)
        .bind(item.selling_price)
        .bind(item.min_threshold)
        .bind(item.max_threshold)
        .bind(item.expiry_date)
        .bind(&item.batch_number)
        .bind(&item.supplier)
        .bind(item.is_active)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }
        Ok(())
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO stock_movements ({MOVEMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#
        ))
        .bind(movement.id)
        .bind(movement.owner_id)
        .bind(movement.item_id)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity_change)
        .bind(movement.previous_quantity)
        .bind(movement.new_quantity)
        .bind(movement.reference_sale_id)
        .bind(&movement.note)
        .bind(movement.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn lock_sale(&mut self, owner_id: Uuid, sale_id: Uuid) -> AppResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(sale_id)
        .bind(owner_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert_sale(&mut self, sale: &Sale) -> AppResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO sales ({SALE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        ))
        .bind(sale.id)
        .bind(sale.owner_id)
        .bind(sale.item_id)
        .bind(sale.quantity)
        .bind(sale.unit_price)
        .bind(sale.cost_price)
        .bind(sale.total_amount)
        .bind(sale.profit_amount)
        .bind(sale.payment_method.as_str())
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.notes)
        .bind(sale.sale_date)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn update_sale(&mut self, sale: &Sale) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET payment_method = $3, customer_name = $4, customer_phone = $5, notes = $6
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(sale.id)
        .bind(sale.owner_id)
        .bind(sale.payment_method.as_str())
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.notes)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }
        Ok(())
    }

    async fn delete_sale(&mut self, owner_id: Uuid, sale_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1 AND owner_id = $2")
            .bind(sale_id)
            .bind(owner_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await.map_err(map_db_error)
    }
}
