//! Analytics aggregation for the dashboard and reports
//!
//! These are read-only rollups. A store failure is logged and reported as an
//! empty data set so dashboards keep rendering.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::analytics::{
    self, CategoryPerformance, CategoryStock, CustomerAnalysis, DailySales, HourlySales,
    ItemPerformance, MarginRanges, MarginSpread, PaymentMethodSales, PeriodChange, PeriodSales,
    SalesTotals, StockStatusCounts,
};
use shared::{
    generate_alerts, iso_week_of, month_of, AlertCounts, DateRange, GroupBy, InventoryItem,
    Period, Sale,
};
use uuid::Uuid;

use super::sales_between;
use crate::config::InventoryConfig;
use crate::store::{DynStore, SaleFilter};

/// Days shown in the dashboard sales chart
const DAILY_SALES_DAYS: i64 = 7;

/// Default look-back of the sales report
const SALES_REPORT_DAYS: i64 = 30;

/// Analytics service for dashboards and reports
#[derive(Clone)]
pub struct AnalyticsService {
    store: DynStore,
    settings: InventoryConfig,
}

/// Today / this week / this month at a glance
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: SalesTotals,
    pub this_week: SalesTotals,
    pub this_month: SalesTotals,
    pub top_items: Vec<ItemPerformance>,
    pub daily_sales: Vec<DailySales>,
    pub stock: StockStatusCounts,
    pub margins: MarginSpread,
    pub alerts: AlertCounts,
}

/// Totals for one side of a comparison
#[derive(Debug, Clone, Serialize)]
pub struct PeriodTotals {
    pub range: DateRange,
    pub totals: SalesTotals,
}

/// Current period against the one before it
#[derive(Debug, Clone, Serialize)]
pub struct PeriodComparison {
    pub period: Period,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub change: PeriodChange,
}

/// Optional bounds for the profit report; defaults to the current month
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfitQuery {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}

/// Profit broken down by item and category
#[derive(Debug, Clone, Serialize)]
pub struct ProfitReport {
    pub range: DateRange,
    pub totals: SalesTotals,
    pub items: Vec<ItemPerformance>,
    pub categories: Vec<CategoryPerformance>,
}

/// Bounds and bucket size for the sales report; defaults to the last 30 days
/// by day
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesReportQuery {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub group_by: GroupBy,
}

/// Sales trends, payment mix, busy hours and customer figures
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub range: DateRange,
    pub group_by: GroupBy,
    pub totals: SalesTotals,
    pub sales_over_time: Vec<PeriodSales>,
    pub payment_methods: Vec<PaymentMethodSales>,
    pub hourly: Vec<HourlySales>,
    pub customers: CustomerAnalysis,
}

/// Stock valuation and health
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub total_cost_value: Decimal,
    pub total_selling_value: Decimal,
    pub potential_profit: Decimal,
    pub categories: Vec<CategoryStock>,
    pub stock: StockStatusCounts,
    pub margin_ranges: MarginRanges,
}

impl AnalyticsService {
    /// Create a new AnalyticsService instance
    pub fn new(store: DynStore, settings: InventoryConfig) -> Self {
        Self { store, settings }
    }

    async fn sales_or_empty(&self, owner_id: Uuid, filter: &SaleFilter) -> Vec<Sale> {
        match self.store.list_sales(owner_id, filter).await {
            Ok(details) => details.into_iter().map(|detail| detail.sale).collect(),
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, "Analytics degraded, sales unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Items for name and category lookup, including retired ones
    async fn items_or_empty(&self, owner_id: Uuid) -> Vec<InventoryItem> {
        match self.store.list_items(owner_id, true).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, "Analytics degraded, items unavailable: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn dashboard(&self, owner_id: Uuid, now: DateTime<Utc>) -> Dashboard {
        let today = now.date_naive();
        let week = iso_week_of(today);
        let month = month_of(today);
        let chart_start = today - Duration::days(DAILY_SALES_DAYS - 1);
        let earliest = week.start.min(month.start).min(chart_start);

        let sales = self
            .sales_or_empty(owner_id, &sales_between(&DateRange::new(earliest, today)))
            .await;
        let all_items = self.items_or_empty(owner_id).await;
        let active: Vec<InventoryItem> = all_items.iter().filter(|i| i.is_active).cloned().collect();

        let month_sales = analytics::sales_in(&sales, &month);
        let mut top_items = analytics::item_performance(&month_sales, &all_items);
        top_items.truncate(self.settings.top_items_limit);

        Dashboard {
            today: SalesTotals::from_sales(analytics::sales_in(&sales, &DateRange::day(today))),
            this_week: SalesTotals::from_sales(analytics::sales_in(&sales, &week)),
            this_month: SalesTotals::from_sales(month_sales.iter().copied()),
            top_items,
            daily_sales: analytics::daily_sales(&sales, today, DAILY_SALES_DAYS),
            stock: StockStatusCounts::tally(&active),
            margins: MarginSpread::of(&active),
            alerts: AlertCounts::tally(&generate_alerts(&active, now)),
        }
    }

    pub async fn comparison(&self, owner_id: Uuid, period: Period, now: DateTime<Utc>) -> PeriodComparison {
        let (current_range, previous_range) = period.bounds(now.date_naive());

        let current = SalesTotals::from_sales(
            &self.sales_or_empty(owner_id, &sales_between(&current_range)).await,
        );
        let previous = SalesTotals::from_sales(
            &self.sales_or_empty(owner_id, &sales_between(&previous_range)).await,
        );

        PeriodComparison {
            period,
            change: PeriodChange::between(&current, &previous),
            current: PeriodTotals {
                range: current_range,
                totals: current,
            },
            previous: PeriodTotals {
                range: previous_range,
                totals: previous,
            },
        }
    }

    pub async fn profit(&self, owner_id: Uuid, query: &ProfitQuery, now: DateTime<Utc>) -> ProfitReport {
        let month = month_of(now.date_naive());
        let range = DateRange::new(
            query.from.unwrap_or(month.start),
            query.to.unwrap_or(month.end),
        );

        let sales = self.sales_or_empty(owner_id, &sales_between(&range)).await;
        let items = self.items_or_empty(owner_id).await;
        let refs: Vec<&Sale> = sales.iter().collect();

        let mut by_profit = analytics::item_performance(&refs, &items);
        by_profit.sort_by(|a, b| b.profit.cmp(&a.profit));

        ProfitReport {
            range,
            totals: SalesTotals::from_sales(&sales),
            items: by_profit,
            categories: analytics::category_performance(&refs, &items),
        }
    }

    pub async fn sales(&self, owner_id: Uuid, query: &SalesReportQuery, now: DateTime<Utc>) -> SalesReport {
        let today = now.date_naive();
        let range = DateRange::new(
            query.from.unwrap_or(today - Duration::days(SALES_REPORT_DAYS)),
            query.to.unwrap_or(today),
        );

        let sales = self.sales_or_empty(owner_id, &sales_between(&range)).await;
        let refs: Vec<&Sale> = sales.iter().collect();

        SalesReport {
            range,
            group_by: query.group_by,
            totals: SalesTotals::from_sales(&sales),
            sales_over_time: analytics::sales_over_time(&refs, query.group_by),
            payment_methods: analytics::payment_method_breakdown(&refs),
            hourly: analytics::hourly_sales(&refs),
            customers: CustomerAnalysis::of(&refs),
        }
    }

    pub async fn inventory(&self, owner_id: Uuid) -> InventoryReport {
        let active: Vec<InventoryItem> = self
            .items_or_empty(owner_id)
            .await
            .into_iter()
            .filter(|item| item.is_active)
            .collect();

        let total_cost_value: Decimal = active.iter().map(InventoryItem::total_cost_value).sum();
        let total_selling_value: Decimal =
            active.iter().map(InventoryItem::total_selling_value).sum();

        InventoryReport {
            total_cost_value,
            total_selling_value,
            potential_profit: total_selling_value - total_cost_value,
            categories: analytics::category_stock(&active),
            stock: StockStatusCounts::tally(&active),
            margin_ranges: MarginRanges::of(&active),
        }
    }
}
