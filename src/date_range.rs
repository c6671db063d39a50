use crate::error::Error;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive range of calendar dates, both ends in UTC.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The whole calendar month named by `YYYY-MM`.
    pub fn month(month: &str) -> Result<Self, Error> {
        let start = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
            .map_err(|_| Error::Month(month.to_string()))?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| Error::Month(month.to_string()))?;
        Ok(Self { start, end })
    }

    pub fn contains(self: &Self, time: &DateTime<Utc>) -> bool {
        let date = time.date_naive();
        date >= self.start && date <= self.end
    }

    /// Start of the first day, as sent to the catalog.
    pub fn start_param(self: &Self) -> String {
        format!("{}T00:00:00Z", self.start.format("%Y-%m-%d"))
    }

    /// Last second of the final day, so the end date is included.
    pub fn end_param(self: &Self) -> String {
        format!("{}T23:59:59Z", self.end.format("%Y-%m-%d"))
    }

    pub fn label(self: &Self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}
