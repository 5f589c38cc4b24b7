use chrono::{Datelike, Months, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::PlanError;

/// A calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthId(NaiveDate);

impl MonthId {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(MonthId)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The following calendar month.
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(MonthId)
    }

    /// Month containing the given day.
    pub fn containing(date: NaiveDate) -> Self {
        MonthId(date.with_day(1).unwrap_or(date))
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthId {
    type Err = PlanError;

    /// Accepts `YYYY-MM`, with the month given as one or two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PlanError::Format(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(err)?;

        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        MonthId::new(year, month).ok_or_else(err)
    }
}

impl Serialize for MonthId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single-month query window. `start` and `end` are always the same month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: MonthId,
    pub end: MonthId,
}

impl MonthRange {
    pub fn single(month: MonthId) -> Self {
        MonthRange {
            start: month,
            end: month,
        }
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

/// Expands an inclusive `[start, end]` month interval into one range per month,
/// in ascending order.
pub fn generate_monthly_ranges(start: &str, end: &str) -> Result<Vec<MonthRange>, PlanError> {
    let first: MonthId = start.trim().parse()?;
    let last: MonthId = end.trim().parse()?;

    if first > last {
        return Err(PlanError::Order {
            start: first.to_string(),
            end: last.to_string(),
        });
    }

    let mut ranges = Vec::with_capacity(month_count(first, last));
    let mut current = Some(first);
    while let Some(month) = current.filter(|m| *m <= last) {
        debug!(action = "plan", component = "range_planner", month = %month, "Planned month");
        ranges.push(MonthRange::single(month));
        current = month.succ();
    }

    info!(
        action = "complete",
        component = "range_planner",
        start = %first,
        end = %last,
        month_count = ranges.len(),
        "Monthly ranges generated"
    );
    Ok(ranges)
}

/// Number of months in `[start, end]`, zero when inverted.
pub fn month_count(start: MonthId, end: MonthId) -> usize {
    let span = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if span < 0 {
        0
    } else {
        span as usize + 1
    }
}

/// The calendar month before the one containing `today`.
pub fn previous_month(today: NaiveDate) -> MonthId {
    let this_month = MonthId::containing(today);
    this_month
        .0
        .checked_sub_months(Months::new(1))
        .map(MonthId)
        .unwrap_or(this_month)
}
