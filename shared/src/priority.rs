//! Urgency ordering and sales recommendations

use chrono::{DateTime, Utc};

use crate::expiry::{days_until_expiry, priority_of, Perishable, SOON_DAYS, WEEK_DAYS};
use crate::models::{Priority, Recommendation, RecommendationReason};

/// Sort key: dated before undated, then days until expiry (expired items are
/// negative and therefore first), then lowest stock.
fn urgency_key<T: Perishable>(item: &T, now: DateTime<Utc>) -> (bool, i64, i32) {
    match item.expiry_date() {
        Some(date) => (false, days_until_expiry(date, now), item.quantity()),
        None => (true, 0, item.quantity()),
    }
}

/// Order items by urgency. The sort is stable, so items with equal keys keep
/// their incoming order.
pub fn sort_by_priority<T: Perishable>(mut items: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
    items.sort_by_cached_key(|item| urgency_key(item, now));
    items
}

/// Items worth pushing at the counter: in stock, and either expiring within
/// a week or at/below their minimum threshold. Ordered by urgency.
pub fn recommendations<T: Perishable>(
    items: &[T],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<Recommendation> {
    let candidates: Vec<&T> = items
        .iter()
        .filter(|item| item.quantity() > 0)
        .filter(|item| {
            priority_of(*item, now) != Priority::Low || item.quantity() <= item.min_threshold()
        })
        .collect();

    sort_by_priority(candidates, now)
        .into_iter()
        .take(limit)
        .map(|item| {
            let days = item.expiry_date().map(|date| days_until_expiry(date, now));
            let reason = match days {
                Some(d) if d < 0 => RecommendationReason::Expired,
                Some(d) if d <= SOON_DAYS => RecommendationReason::ExpiresVerySoon,
                Some(d) if d <= WEEK_DAYS => RecommendationReason::ExpiresThisWeek,
                _ => RecommendationReason::LowStock,
            };
            Recommendation {
                item_id: item.item_id(),
                item_name: item.item_name().to_string(),
                quantity: item.quantity(),
                days_until_expiry: days,
                priority: priority_of(item, now),
                reason,
                action: reason.action().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use proptest::prelude::*;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    struct Stock {
        id: Uuid,
        name: &'static str,
        quantity: i32,
        min: i32,
        expiry: Option<NaiveDate>,
    }

    impl Perishable for Stock {
        fn item_id(&self) -> Uuid {
            self.id
        }
        fn item_name(&self) -> &str {
            self.name
        }
        fn quantity(&self) -> i32 {
            self.quantity
        }
        fn expiry_date(&self) -> Option<NaiveDate> {
            self.expiry
        }
        fn min_threshold(&self) -> i32 {
            self.min
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
    }

    fn stock(name: &'static str, quantity: i32, in_days: Option<i64>) -> Stock {
        Stock {
            id: Uuid::new_v4(),
            name,
            quantity,
            min: 5,
            expiry: in_days.map(|d| now().date_naive() + Duration::days(d)),
        }
    }

    fn names(items: &[Stock]) -> Vec<&'static str> {
        items.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_sort_order() {
        let items = vec![
            stock("undated-big", 40, None),
            stock("month", 10, Some(30)),
            stock("expired", 3, Some(-2)),
            stock("undated-small", 2, None),
            stock("tomorrow", 8, Some(1)),
        ];
        let sorted = sort_by_priority(items, now());
        assert_eq!(
            names(&sorted),
            vec!["expired", "tomorrow", "month", "undated-small", "undated-big"]
        );
    }

    #[test]
    fn test_same_expiry_lower_stock_first() {
        let items = vec![stock("many", 20, Some(2)), stock("few", 4, Some(2))];
        assert_eq!(names(&sort_by_priority(items, now())), vec!["few", "many"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let items = vec![
            stock("a", 5, Some(4)),
            stock("b", 5, Some(4)),
            stock("c", 5, Some(4)),
        ];
        assert_eq!(names(&sort_by_priority(items, now())), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_recommendations_skip_empty_and_fresh() {
        let items = vec![
            stock("fresh", 50, Some(30)),
            stock("sold-out", 0, Some(1)),
            stock("expired", 2, Some(-1)),
            stock("week", 12, Some(6)),
            stock("low", 3, None),
        ];
        let recs = recommendations(&items, now(), 5);
        let got: Vec<(&str, RecommendationReason)> = recs
            .iter()
            .map(|r| (r.item_name.as_str(), r.reason))
            .collect();
        assert_eq!(
            got,
            vec![
                ("expired", RecommendationReason::Expired),
                ("week", RecommendationReason::ExpiresThisWeek),
                ("low", RecommendationReason::LowStock),
            ]
        );
        assert_eq!(recs[0].action, "Remove from inventory");
    }

    #[test]
    fn test_recommendations_respect_limit() {
        let items: Vec<Stock> = (0..10).map(|i| stock("soon", 1 + i, Some(2))).collect();
        assert_eq!(recommendations(&items, now(), 5).len(), 5);
    }

    fn arb_stock() -> impl Strategy<Value = Stock> {
        (0i32..50, prop::option::of(-20i64..40)).prop_map(|(q, d)| stock("x", q, d))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_sort_is_idempotent(items in prop::collection::vec(arb_stock(), 0..30)) {
            let once = sort_by_priority(items.clone(), now());
            let twice = sort_by_priority(once.clone(), now());
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(sort_by_priority(items, now()), once);
        }

        #[test]
        fn prop_dated_items_precede_undated(items in prop::collection::vec(arb_stock(), 0..30)) {
            let sorted = sort_by_priority(items, now());
            let first_undated = sorted.iter().position(|s| s.expiry.is_none()).unwrap_or(sorted.len());
            prop_assert!(sorted[first_undated..].iter().all(|s| s.expiry.is_none()));
        }
    }
}
