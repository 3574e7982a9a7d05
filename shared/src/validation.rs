//! Validation utilities for inventory and sales input
//!
//! Decimal and cross-field rules live here; string lengths and integer ranges
//! are declared on the request types with `validator`.

use rust_decimal::Decimal;

/// Money is kept to cents
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(14, 2)` column holds: 999,999,999,999.99
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, MONEY_SCALE)
}

/// Round to cents, the precision every price and total is stored at
pub fn to_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_SCALE)
}

// ============================================================================
// Inventory Validations
// ============================================================================

/// Prices must be non-negative and leave a positive margin
pub fn validate_prices(cost_price: Decimal, selling_price: Decimal) -> Result<(), &'static str> {
    if cost_price < Decimal::ZERO {
        return Err("Cost price cannot be negative");
    }
    if selling_price < Decimal::ZERO {
        return Err("Selling price cannot be negative");
    }
    if cost_price > max_amount() || selling_price > max_amount() {
        return Err("Price exceeds the largest supported amount");
    }
    if selling_price <= cost_price {
        return Err("Selling price must be higher than cost price");
    }
    Ok(())
}

pub fn validate_stock_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity must be a non-negative integer");
    }
    Ok(())
}

/// Minimum must be non-negative; an explicit maximum may not be below it
pub fn validate_thresholds(min_threshold: i32, max_threshold: Option<i32>) -> Result<(), &'static str> {
    if min_threshold < 0 {
        return Err("Minimum threshold must be a non-negative integer");
    }
    if let Some(max) = max_threshold {
        if max < min_threshold {
            return Err("Maximum threshold cannot be below the minimum threshold");
        }
    }
    Ok(())
}

// ============================================================================
// Sales Validations
// ============================================================================

pub fn validate_sale_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

pub fn validate_unit_price(unit_price: Decimal) -> Result<(), &'static str> {
    if unit_price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    if unit_price > max_amount() {
        return Err("Unit price exceeds the largest supported amount");
    }
    Ok(())
}

/// Ethiopian phone number in international form: `+251` followed by 9 digits
pub fn validate_ethiopian_phone(phone: &str) -> Result<(), &'static str> {
    let valid = phone
        .strip_prefix("+251")
        .is_some_and(|rest| rest.len() == 9 && rest.chars().all(|c| c.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err("Please provide a valid Ethiopian phone number (+251XXXXXXXXX)")
    }
}
