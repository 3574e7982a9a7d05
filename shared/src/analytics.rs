//! Read-side rollups over sale history and the current item snapshot
//!
//! All functions are total: empty input produces zero values, never an error.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{InventoryItem, PaymentMethod, Sale, StockStatus};
use crate::types::{DateRange, GroupBy};

pub const UNCATEGORIZED: &str = "Uncategorized";

fn hundred() -> Decimal {
    Decimal::from(100)
}

/// `profit / revenue × 100`, 0 when there is no revenue
pub fn profit_margin(profit: Decimal, revenue: Decimal) -> Decimal {
    if revenue.is_zero() {
        return Decimal::ZERO;
    }
    (profit / revenue * hundred()).round_dp(2)
}

/// Period-over-period change in percent.
///
/// A previous value of zero yields 100 when the current value is positive and
/// 0 otherwise.
pub fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            hundred()
        } else {
            Decimal::ZERO
        };
    }
    ((current - previous) / previous * hundred()).round_dp(2)
}

/// Sales falling inside `range` (by UTC calendar day)
pub fn sales_in<'a>(sales: &'a [Sale], range: &DateRange) -> Vec<&'a Sale> {
    sales
        .iter()
        .filter(|sale| range.contains(sale.sale_date.date_naive()))
        .collect()
}

/// Count, volume and money totals over a set of sales
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesTotals {
    pub sales_count: i64,
    pub items_sold: i64,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub average_sale_amount: Decimal,
}

impl SalesTotals {
    pub fn from_sales<'a, I>(sales: I) -> Self
    where
        I: IntoIterator<Item = &'a Sale>,
    {
        let mut totals = sales.into_iter().fold(Self::default(), |mut acc, sale| {
            acc.sales_count += 1;
            acc.items_sold += i64::from(sale.quantity);
            acc.revenue += sale.total_amount;
            acc.cost += sale.cost_amount();
            acc.profit += sale.profit_amount;
            acc
        });

        totals.profit_margin = profit_margin(totals.profit, totals.revenue);
        if totals.sales_count > 0 {
            totals.average_sale_amount =
                (totals.revenue / Decimal::from(totals.sales_count)).round_dp(2);
        }
        totals
    }
}

/// Percentage change of each metric between two periods
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodChange {
    pub sales_count: Decimal,
    pub items_sold: Decimal,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub average_sale_amount: Decimal,
}

impl PeriodChange {
    pub fn between(current: &SalesTotals, previous: &SalesTotals) -> Self {
        Self {
            sales_count: percent_change(
                Decimal::from(current.sales_count),
                Decimal::from(previous.sales_count),
            ),
            items_sold: percent_change(
                Decimal::from(current.items_sold),
                Decimal::from(previous.items_sold),
            ),
            revenue: percent_change(current.revenue, previous.revenue),
            profit: percent_change(current.profit, previous.profit),
            average_sale_amount: percent_change(
                current.average_sale_amount,
                previous.average_sale_amount,
            ),
        }
    }
}

/// Sales performance of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPerformance {
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub average_unit_price: Decimal,
}

/// Per-item rollup, best sellers (by quantity) first.
///
/// `items` resolves names; sales of items no longer present are reported
/// under their id.
pub fn item_performance(sales: &[&Sale], items: &[InventoryItem]) -> Vec<ItemPerformance> {
    let names: HashMap<Uuid, &str> = items.iter().map(|i| (i.id, i.name.as_str())).collect();
    let mut by_item: HashMap<Uuid, (i64, Decimal, Decimal)> = HashMap::new();

    for sale in sales {
        let entry = by_item
            .entry(sale.item_id)
            .or_insert((0, Decimal::ZERO, Decimal::ZERO));
        entry.0 += i64::from(sale.quantity);
        entry.1 += sale.total_amount;
        entry.2 += sale.profit_amount;
    }

    let mut rows: Vec<ItemPerformance> = by_item
        .into_iter()
        .map(|(item_id, (quantity_sold, revenue, profit))| ItemPerformance {
            item_id,
            item_name: names
                .get(&item_id)
                .map(|name| name.to_string())
                .unwrap_or_else(|| item_id.to_string()),
            quantity_sold,
            revenue,
            profit,
            profit_margin: profit_margin(profit, revenue),
            average_unit_price: if quantity_sold > 0 {
                (revenue / Decimal::from(quantity_sold)).round_dp(2)
            } else {
                Decimal::ZERO
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    rows
}

/// Revenue and profit of one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub sales_count: i64,
    pub items_sold: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
}

/// Per-category rollup, highest revenue first
pub fn category_performance(sales: &[&Sale], items: &[InventoryItem]) -> Vec<CategoryPerformance> {
    let categories: HashMap<Uuid, &str> = items
        .iter()
        .map(|i| (i.id, i.category.as_deref().unwrap_or(UNCATEGORIZED)))
        .collect();
    let mut by_category: HashMap<&str, Vec<&Sale>> = HashMap::new();

    for sale in sales {
        let category = categories.get(&sale.item_id).copied().unwrap_or(UNCATEGORIZED);
        by_category.entry(category).or_default().push(sale);
    }

    let mut rows: Vec<CategoryPerformance> = by_category
        .into_iter()
        .map(|(category, sales)| {
            let totals = SalesTotals::from_sales(sales);
            CategoryPerformance {
                category: category.to_string(),
                sales_count: totals.sales_count,
                items_sold: totals.items_sold,
                revenue: totals.revenue,
                profit: totals.profit,
                profit_margin: totals.profit_margin,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

/// One day in the recent-sales chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales_count: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

/// The `days` calendar days ending at `last_day`, oldest first, zero-filled
pub fn daily_sales(sales: &[Sale], last_day: NaiveDate, days: i64) -> Vec<DailySales> {
    (0..days.max(0))
        .rev()
        .map(|offset| {
            let date = last_day - Duration::days(offset);
            let totals = SalesTotals::from_sales(sales_in(sales, &DateRange::day(date)));
            DailySales {
                date,
                sales_count: totals.sales_count,
                revenue: totals.revenue,
                profit: totals.profit,
            }
        })
        .collect()
}

/// One bucket of the sales-over-time chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSales {
    pub period: String,
    pub start: NaiveDate,
    pub sales_count: i64,
    pub items_sold: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub average_sale_amount: Decimal,
}

/// Sales bucketed by day, ISO week or month, oldest first. Empty buckets are
/// left out.
pub fn sales_over_time(sales: &[&Sale], group_by: GroupBy) -> Vec<PeriodSales> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&Sale>> = BTreeMap::new();
    for sale in sales {
        let start = group_by.bucket_start(sale.sale_date.date_naive());
        buckets.entry(start).or_default().push(sale);
    }

    buckets
        .into_iter()
        .map(|(start, sales)| {
            let totals = SalesTotals::from_sales(sales);
            PeriodSales {
                period: group_by.label(start),
                start,
                sales_count: totals.sales_count,
                items_sold: totals.items_sold,
                revenue: totals.revenue,
                profit: totals.profit,
                average_sale_amount: totals.average_sale_amount,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodSales {
    pub payment_method: PaymentMethod,
    pub sales_count: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

/// Totals per payment method, highest revenue first
pub fn payment_method_breakdown(sales: &[&Sale]) -> Vec<PaymentMethodSales> {
    let mut by_method: HashMap<PaymentMethod, Vec<&Sale>> = HashMap::new();
    for sale in sales {
        by_method.entry(sale.payment_method).or_default().push(sale);
    }

    let mut rows: Vec<PaymentMethodSales> = by_method
        .into_iter()
        .map(|(payment_method, sales)| {
            let totals = SalesTotals::from_sales(sales);
            PaymentMethodSales {
                payment_method,
                sales_count: totals.sales_count,
                revenue: totals.revenue,
                profit: totals.profit,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.payment_method.as_str().cmp(b.payment_method.as_str()))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySales {
    /// Hour of day, UTC
    pub hour: u32,
    pub sales_count: i64,
    pub revenue: Decimal,
}

/// Sales per hour of day, earliest hour first; hours without sales are left out
pub fn hourly_sales(sales: &[&Sale]) -> Vec<HourlySales> {
    let mut by_hour: BTreeMap<u32, Vec<&Sale>> = BTreeMap::new();
    for sale in sales {
        by_hour.entry(sale.sale_date.hour()).or_default().push(sale);
    }

    by_hour
        .into_iter()
        .map(|(hour, sales)| {
            let totals = SalesTotals::from_sales(sales);
            HourlySales {
                hour,
                sales_count: totals.sales_count,
                revenue: totals.revenue,
            }
        })
        .collect()
}

/// Repeat-customer figures, keyed on the customer phone number
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerAnalysis {
    pub unique_customers: i64,
    pub sales_with_customer_info: i64,
    pub average_customer_sale: Decimal,
}

impl CustomerAnalysis {
    pub fn of(sales: &[&Sale]) -> Self {
        let known: Vec<&Sale> = sales
            .iter()
            .copied()
            .filter(|sale| sale.customer_phone.is_some())
            .collect();
        let phones: HashSet<&str> = known
            .iter()
            .filter_map(|sale| sale.customer_phone.as_deref())
            .collect();

        Self {
            unique_customers: phones.len() as i64,
            sales_with_customer_info: known.len() as i64,
            average_customer_sale: SalesTotals::from_sales(known).average_sale_amount,
        }
    }
}

/// Item counts per stock status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockStatusCounts {
    pub out_of_stock: i64,
    pub low_stock: i64,
    pub normal_stock: i64,
    pub overstock: i64,
    pub total_items: i64,
}

impl StockStatusCounts {
    pub fn tally(items: &[InventoryItem]) -> Self {
        items.iter().fold(Self::default(), |mut counts, item| {
            match item.stock_status() {
                StockStatus::OutOfStock => counts.out_of_stock += 1,
                StockStatus::LowStock => counts.low_stock += 1,
                StockStatus::Normal => counts.normal_stock += 1,
                StockStatus::Overstock => counts.overstock += 1,
            }
            counts.total_items += 1;
            counts
        })
    }
}

/// Spread of markup over cost across items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarginSpread {
    pub average_markup: Decimal,
    pub min_markup: Decimal,
    pub max_markup: Decimal,
    /// Markup below 20%
    pub low_margin_items: i64,
    /// Markup of 50% or more
    pub high_margin_items: i64,
}

impl MarginSpread {
    pub fn of(items: &[InventoryItem]) -> Self {
        let markups: Vec<Decimal> = items.iter().map(InventoryItem::markup_percent).collect();
        if markups.is_empty() {
            return Self::default();
        }
        let sum: Decimal = markups.iter().sum();
        Self {
            average_markup: (sum / Decimal::from(markups.len() as i64)).round_dp(2),
            min_markup: markups.iter().copied().min().unwrap_or_default().round_dp(2),
            max_markup: markups.iter().copied().max().unwrap_or_default().round_dp(2),
            low_margin_items: markups.iter().filter(|m| **m < Decimal::from(20)).count() as i64,
            high_margin_items: markups.iter().filter(|m| **m >= Decimal::from(50)).count() as i64,
        }
    }
}

/// Items bucketed by markup over cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarginRanges {
    pub very_low: i64,
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub very_high: i64,
}

impl MarginRanges {
    pub fn of(items: &[InventoryItem]) -> Self {
        items.iter().fold(Self::default(), |mut ranges, item| {
            let markup = item.markup_percent();
            if markup < Decimal::from(10) {
                ranges.very_low += 1;
            } else if markup < Decimal::from(20) {
                ranges.low += 1;
            } else if markup < Decimal::from(40) {
                ranges.medium += 1;
            } else if markup < Decimal::from(60) {
                ranges.high += 1;
            } else {
                ranges.very_high += 1;
            }
            ranges
        })
    }
}

/// Stock held in one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStock {
    pub category: String,
    pub item_count: i64,
    pub total_quantity: i64,
    pub cost_value: Decimal,
    pub selling_value: Decimal,
    pub average_markup: Decimal,
}

/// Per-category stock valuation, highest cost value first
pub fn category_stock(items: &[InventoryItem]) -> Vec<CategoryStock> {
    let mut by_category: HashMap<&str, Vec<&InventoryItem>> = HashMap::new();
    for item in items {
        by_category
            .entry(item.category.as_deref().unwrap_or(UNCATEGORIZED))
            .or_default()
            .push(item);
    }

    let mut rows: Vec<CategoryStock> = by_category
        .into_iter()
        .map(|(category, items)| {
            let markup_sum: Decimal = items.iter().map(|i| i.markup_percent()).sum();
            CategoryStock {
                category: category.to_string(),
                item_count: items.len() as i64,
                total_quantity: items.iter().map(|i| i64::from(i.quantity)).sum(),
                cost_value: items.iter().map(|i| i.total_cost_value()).sum(),
                selling_value: items.iter().map(|i| i.total_selling_value()).sum(),
                average_markup: (markup_sum / Decimal::from(items.len() as i64)).round_dp(2),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.cost_value
            .cmp(&a.cost_value)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}
