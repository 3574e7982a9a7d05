//! Stock movement audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UnknownVariant;

/// Cause of a quantity change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Sale,
    Return,
    Adjustment,
    /// Non-revenue depletion of expired stock
    Waste,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Sale => "sale",
            MovementType::Return => "return",
            MovementType::Adjustment => "adjustment",
            MovementType::Waste => "waste",
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(MovementType::Purchase),
            "sale" => Ok(MovementType::Sale),
            "return" => Ok(MovementType::Return),
            "adjustment" => Ok(MovementType::Adjustment),
            "waste" => Ok(MovementType::Waste),
            other => Err(UnknownVariant::new("movement type", other)),
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one quantity change.
///
/// Built only through [`StockMovement::record`], which derives the delta from
/// the before and after quantities so `previous + change == new` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockMovement {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity_change: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reference_sale_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn record(
        owner_id: Uuid,
        item_id: Uuid,
        movement_type: MovementType,
        previous_quantity: i32,
        new_quantity: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            item_id,
            movement_type,
            quantity_change: new_quantity - previous_quantity,
            previous_quantity,
            new_quantity,
            reference_sale_id: None,
            note: None,
            created_at,
        }
    }

    pub fn with_sale(mut self, sale_id: Uuid) -> Self {
        self.reference_sale_id = Some(sale_id);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_consistent(&self) -> bool {
        self.previous_quantity + self.quantity_change == self.new_quantity
    }
}
