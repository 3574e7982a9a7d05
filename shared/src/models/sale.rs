//! Sale records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UnknownVariant;
use crate::validation::max_amount;

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    MobileMoney,
    BankTransfer,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "mobile_money" => Ok(PaymentMethod::MobileMoney),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "credit" => Ok(PaymentMethod::Credit),
            other => Err(UnknownVariant::new("payment method", other)),
        }
    }
}

/// Revenue-generating depletion of one item.
///
/// `unit_price` and `cost_price` are snapshots taken when the sale was
/// recorded; `total_amount` and `profit_amount` are never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub total_amount: Decimal,
    pub profit_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
}

/// Totals fixed at the moment of sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleAmounts {
    pub total_amount: Decimal,
    pub profit_amount: Decimal,
}

impl SaleAmounts {
    /// Totals for `quantity` units. Fails when either amount would not fit a
    /// stored money column.
    pub fn compute(
        quantity: i32,
        unit_price: Decimal,
        cost_price: Decimal,
    ) -> Result<Self, &'static str> {
        const TOO_LARGE: &str = "Sale total exceeds the largest supported amount";

        let quantity = Decimal::from(quantity);
        let total_amount = quantity.checked_mul(unit_price).ok_or(TOO_LARGE)?;
        let profit_amount = unit_price
            .checked_sub(cost_price)
            .and_then(|margin| quantity.checked_mul(margin))
            .ok_or(TOO_LARGE)?;

        let limit = max_amount();
        if total_amount > limit || profit_amount.abs() > limit {
            return Err(TOO_LARGE);
        }
        Ok(Self {
            total_amount,
            profit_amount,
        })
    }
}

impl Sale {
    /// Cost of goods sold at the snapshotted cost price
    pub fn cost_amount(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.cost_price)
    }
}

/// Sale joined with the item's display fields
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub item_name: String,
    pub item_unit: String,
    pub category: Option<String>,
}
