//! Expiry arithmetic and priority tiers
//!
//! Every function takes the reference instant from the caller so that a batch
//! of items evaluated together shares one notion of "now".

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{ExpiryStatus, Priority};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Days within which an item is treated as high priority
pub const SOON_DAYS: i64 = 3;
/// Days within which an item is treated as medium priority
pub const WEEK_DAYS: i64 = 7;

/// Anything that carries stock and may expire
pub trait Perishable {
    fn item_id(&self) -> Uuid;
    fn item_name(&self) -> &str;
    fn quantity(&self) -> i32;
    fn expiry_date(&self) -> Option<NaiveDate>;
    fn min_threshold(&self) -> i32;
}

impl<T: Perishable + ?Sized> Perishable for &T {
    fn item_id(&self) -> Uuid {
        (**self).item_id()
    }

    fn item_name(&self) -> &str {
        (**self).item_name()
    }

    fn quantity(&self) -> i32 {
        (**self).quantity()
    }

    fn expiry_date(&self) -> Option<NaiveDate> {
        (**self).expiry_date()
    }

    fn min_threshold(&self) -> i32 {
        (**self).min_threshold()
    }
}

/// Whole days from `now` until the start of `expiry_date` (UTC), rounded up.
///
/// Negative once the expiry date has fully passed; an item expiring today
/// reports 0 for the rest of the day.
pub fn days_until_expiry(expiry_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expiry_start = expiry_date.and_time(NaiveTime::MIN).and_utc();
    let diff = (expiry_start - now).num_milliseconds();
    let days = diff.div_euclid(MILLIS_PER_DAY);
    if diff.rem_euclid(MILLIS_PER_DAY) != 0 {
        days + 1
    } else {
        days
    }
}

pub fn is_expired(expiry_date: NaiveDate, now: DateTime<Utc>) -> bool {
    days_until_expiry(expiry_date, now) < 0
}

/// Priority tier for a given number of days until expiry
pub fn priority_for_days(days: Option<i64>) -> Priority {
    match days {
        None => Priority::Low,
        Some(d) if d <= SOON_DAYS => Priority::High,
        Some(d) if d <= WEEK_DAYS => Priority::Medium,
        Some(_) => Priority::Low,
    }
}

pub fn priority_of<T: Perishable + ?Sized>(item: &T, now: DateTime<Utc>) -> Priority {
    priority_for_days(item.expiry_date().map(|date| days_until_expiry(date, now)))
}

pub fn expiry_status(days: i64) -> ExpiryStatus {
    if days < 0 {
        ExpiryStatus::Expired
    } else if days <= WEEK_DAYS {
        ExpiryStatus::Expiring
    } else {
        ExpiryStatus::Fresh
    }
}

/// Human readable label shown next to an expiry date
pub fn expiry_status_text(days: i64) -> String {
    match days {
        d if d < 0 => format!("Expired {} days ago", d.abs()),
        0 => "Expires today".to_string(),
        1 => "Expires tomorrow".to_string(),
        d => format!("Expires in {} days", d),
    }
}
