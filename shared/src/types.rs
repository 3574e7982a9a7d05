//! Common types used across the platform

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a stored or submitted string does not name a known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single calendar day
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Reporting period for period-over-period comparisons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// The period containing `today` and the one immediately before it
    pub fn bounds(&self, today: NaiveDate) -> (DateRange, DateRange) {
        match self {
            Period::Week => {
                let current = iso_week_of(today);
                let previous = DateRange::new(
                    current.start - Duration::days(7),
                    current.start - Duration::days(1),
                );
                (current, previous)
            }
            Period::Month => {
                let current = month_of(today);
                let previous = month_of(current.start - Duration::days(1));
                (current, previous)
            }
            Period::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let start = first_of_month(today.year(), first_month);
                let end = last_of_month(today.year(), first_month + 2);
                let previous_end = start - Duration::days(1);
                let previous_start = first_of_month(
                    previous_end.year(),
                    (previous_end.month0() / 3) * 3 + 1,
                );
                (
                    DateRange::new(start, end),
                    DateRange::new(previous_start, previous_end),
                )
            }
            Period::Year => {
                let current = DateRange::new(
                    first_of_month(today.year(), 1),
                    last_of_month(today.year(), 12),
                );
                let previous = DateRange::new(
                    first_of_month(today.year() - 1, 1),
                    last_of_month(today.year() - 1, 12),
                );
                (current, previous)
            }
        }
    }
}

impl std::str::FromStr for Period {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(UnknownVariant::new("period", other)),
        }
    }
}

/// Bucket size for sales-over-time charts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl GroupBy {
    /// First day of the bucket holding `date`
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            GroupBy::Day => date,
            GroupBy::Week => iso_week_of(date).start,
            GroupBy::Month => first_of_month(date.year(), date.month()),
        }
    }

    /// Chart label: `2024-03-13`, `2024-W11` or `2024-03`
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            GroupBy::Day => date.format("%Y-%m-%d").to_string(),
            GroupBy::Week => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            GroupBy::Month => date.format("%Y-%m").to_string(),
        }
    }
}

/// Monday-to-Sunday week containing `date`
pub fn iso_week_of(date: NaiveDate) -> DateRange {
    let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    DateRange::new(start, start + Duration::days(6))
}

/// Calendar month containing `date`
pub fn month_of(date: NaiveDate) -> DateRange {
    DateRange::new(
        first_of_month(date.year(), date.month()),
        last_of_month(date.year(), date.month()),
    )
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_of_month(next_year, next_month) - Duration::days(1)
}
