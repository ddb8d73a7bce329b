//! Report periods: calendar-anchored date ranges for register reports.
//!
//! Every range is half-open: `start` is included, `end` is excluded.

use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized report period: {0} (expected daily, weekly, monthly, quarterly, yearly or all)")]
pub struct InvalidPeriodError(pub String);

// ═══════════════════════════════════════════
// DateRange
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Unbounded on both sides.
    pub fn all_time() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    /// Range covering `first..=last` (both days included).
    pub fn from_inclusive(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first,
            end: last.succ_opt().unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn is_all_time(&self) -> bool {
        self.lower_bound().is_none() && self.upper_bound().is_none()
    }

    /// `None` when the range has no lower limit.
    pub fn lower_bound(&self) -> Option<NaiveDate> {
        (self.start != NaiveDate::MIN).then_some(self.start)
    }

    /// `None` when the range has no upper limit.
    pub fn upper_bound(&self) -> Option<NaiveDate> {
        (self.end != NaiveDate::MAX).then_some(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let after_start = self.lower_bound().map_or(true, |s| date >= s);
        let before_end = self.upper_bound().map_or(true, |e| date < e);
        after_start && before_end
    }

    /// Last day inside the range, if bounded.
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.upper_bound().and_then(|e| e.pred_opt())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower_bound(), self.last_day()) {
            (None, None) => f.write_str("All Time"),
            (Some(s), Some(l)) => write!(f, "{} to {}", s.format("%d/%m/%Y"), l.format("%d/%m/%Y")),
            (Some(s), None) => write!(f, "from {}", s.format("%d/%m/%Y")),
            (None, Some(l)) => write!(f, "up to {}", l.format("%d/%m/%Y")),
        }
    }
}

// ═══════════════════════════════════════════
// ReportPeriod
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    AllTime,
}

impl ReportPeriod {
    pub const ALL: [ReportPeriod; 6] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Yearly,
        Self::AllTime,
    ];

    /// Query-string name, also used in export file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::AllTime => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
            Self::AllTime => "All Time",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = InvalidPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            "all" | "alltime" | "all_time" | "all time" => Ok(Self::AllTime),
            _ => Err(InvalidPeriodError(s.to_string())),
        }
    }
}

// ═══════════════════════════════════════════
// Period resolution
// ═══════════════════════════════════════════

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Resolve a period to the half-open range containing `reference`.
pub fn resolve_period(period: ReportPeriod, reference: NaiveDate) -> DateRange {
    match period {
        ReportPeriod::Daily => DateRange::new(reference, add_days(reference, 1)),
        ReportPeriod::Weekly => {
            let offset = u64::from(reference.weekday().num_days_from_monday());
            let monday = reference
                .checked_sub_days(Days::new(offset))
                .unwrap_or(NaiveDate::MIN);
            DateRange::new(monday, add_days(monday, 7))
        }
        ReportPeriod::Monthly => {
            let start = first_of_month(reference.year(), reference.month());
            DateRange::new(start, add_months(start, 1))
        }
        ReportPeriod::Quarterly => {
            let quarter_month = (reference.month() - 1) / 3 * 3 + 1;
            let start = first_of_month(reference.year(), quarter_month);
            DateRange::new(start, add_months(start, 3))
        }
        ReportPeriod::Yearly => {
            let start = first_of_month(reference.year(), 1);
            DateRange::new(start, add_months(start, 12))
        }
        ReportPeriod::AllTime => DateRange::all_time(),
    }
}

/// Parse a period name and resolve it against `reference`.
pub fn resolve_named_period(
    name: &str,
    reference: NaiveDate,
) -> Result<(ReportPeriod, DateRange), InvalidPeriodError> {
    let period: ReportPeriod = name.parse()?;
    Ok((period, resolve_period(period, reference)))
}
