//! Date window selection.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open date range `[start, end)` used for collection date filters.
///
/// Built only from an anchor date plus a fixed per-variant offset, so the
/// `end > start` invariant holds by construction. An anchor with no matching
/// imagery is handled downstream, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window of `days` days starting at `anchor`.
    pub fn from_anchor(anchor: NaiveDate, days: u32) -> Self {
        Self {
            start: anchor,
            end: anchor + Duration::days(i64::from(days)),
        }
    }

    /// Formatted start date for a range-filter query (`YYYY-MM-DD`).
    pub fn start_string(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Formatted exclusive end date (`YYYY-MM-DD`).
    pub fn end_string(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_string(), self.end_string())
    }
}
