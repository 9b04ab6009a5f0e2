//! Report table rows.

use chrono::NaiveDateTime;

use crate::classifier::TimeOfDay;
use crate::money::Money;

/// One rental, denormalized with its film and category.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRecord {
    pub rental_id: i64,
    pub film_id: i64,
    pub title: String,
    pub category: String,
    pub rating: Option<String>,
    pub rental_rate: Money,
    pub rental_date: NaiveDateTime,
    /// Fixed at extraction time from `rental_date`.
    pub time_of_day: TimeOfDay,
}

/// Running totals for one time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRecord {
    pub time_of_day: TimeOfDay,
    pub total_rentals: i64,
    pub total_revenue: Money,
}

/// A bucket whose stored totals disagree with the detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryDrift {
    pub time_of_day: TimeOfDay,
    /// Totals stored in the summary table (zero if the row is missing).
    pub stored: (i64, Money),
    /// Totals recomputed from the detail table.
    pub expected: (i64, Money),
}
