//! Reporting windows.
//!
//! A window selects rentals by calendar day and, optionally, caps them at an
//! instant. The scheduled run passes "now", so a same-day run reports only
//! rentals up to the moment it was invoked while an after-midnight run for
//! the previous day sees the full day. The cap applies to ranges as well:
//! `range(first, last, Some(t))` drops anything after `t` even when `t`
//! falls before `last`.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::error::{ReportError, Result};

/// Storage format for timestamps.
///
/// The fraction has variable length, so stored values do not sort in time
/// order as text. Compare parsed values instead.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Calendar-day format, also the prefix of every stored timestamp.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
const RANGE_SEPARATOR: &str = "..";

/// Format a timestamp for storage or comparison in SQL.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts a space or `T` separator.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Calendar-day window with an optional inclusive upper instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    first_day: NaiveDate,
    last_day: NaiveDate,
    until: Option<NaiveDateTime>,
}

impl ReportWindow {
    /// The day of `instant`, capped at `instant`.
    pub fn day_until(instant: NaiveDateTime) -> Self {
        Self {
            first_day: instant.date(),
            last_day: instant.date(),
            until: Some(instant),
        }
    }

    /// A full calendar day.
    pub fn whole_day(day: NaiveDate) -> Self {
        Self {
            first_day: day,
            last_day: day,
            until: None,
        }
    }

    /// Closed range of days, optionally capped at `until`.
    pub fn range(first_day: NaiveDate, last_day: NaiveDate, until: Option<NaiveDateTime>) -> Result<Self> {
        if first_day > last_day {
            return Err(ReportError::InvalidWindow {
                first: first_day,
                last: last_day,
            });
        }
        Ok(Self {
            first_day,
            last_day,
            until,
        })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn until(&self) -> Option<NaiveDateTime> {
        self.until
    }

    /// Midnight at the start of the first day (inclusive).
    pub fn lower_bound(&self) -> NaiveDateTime {
        self.first_day.and_time(chrono::NaiveTime::MIN)
    }

    /// Midnight after the last day (exclusive).
    pub fn upper_bound(&self) -> NaiveDateTime {
        self.last_day
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
    }

    /// True if `ts` falls inside the window.
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let date = ts.date();
        date >= self.first_day && date <= self.last_day && self.until.map_or(true, |cap| *ts <= cap)
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_day == self.last_day {
            write!(f, "{}", self.first_day)?;
        } else {
            write!(f, "{}{}{}", self.first_day, RANGE_SEPARATOR, self.last_day)?;
        }
        if let Some(until) = self.until {
            write!(f, " until {}", format_timestamp(&until))?;
        }
        Ok(())
    }
}

/// Parses the command-line target forms:
/// `YYYY-MM-DD HH:MM:SS` (day up to that instant), `YYYY-MM-DD` (whole day),
/// `YYYY-MM-DD..YYYY-MM-DD` (closed range).
impl FromStr for ReportWindow {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parse_date = |value: &str| {
            NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
                .map_err(|_| ReportError::InvalidTarget(s.to_string()))
        };

        if let Some((first, last)) = s.split_once(RANGE_SEPARATOR) {
            return ReportWindow::range(parse_date(first)?, parse_date(last)?, None);
        }
        if let Some(instant) = parse_timestamp(s) {
            return Ok(ReportWindow::day_until(instant));
        }
        parse_date(s).map(ReportWindow::whole_day)
    }
}
