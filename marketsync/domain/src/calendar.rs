use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading-calendar entry. Read-only to this subsystem apart from
/// the base-data refresh phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub market: String,
    pub is_trading: bool,
}

/// Inclusive span of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }
}

/// Outcome of comparing stored calendar coverage against the coverage a
/// target date requires. The calendar must span the target year plus one
/// buffer year on each side; only year ranges not already covered are
/// ever fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarPlan {
    UpToDate,
    NeedsEarlierYears(YearRange),
    NeedsLaterYears(YearRange),
    NeedsBoth {
        earlier: YearRange,
        later: YearRange,
    },
}

impl CalendarPlan {
    pub const BUFFER_YEARS: i32 = 1;

    /// `coverage` is the min/max year present in the calendar store, or
    /// `None` when the calendar is empty.
    pub fn plan(coverage: Option<YearRange>, target_year: i32) -> Self {
        let required = YearRange::new(
            target_year - Self::BUFFER_YEARS,
            target_year + Self::BUFFER_YEARS,
        );

        let Some(existing) = coverage else {
            return CalendarPlan::NeedsLaterYears(required);
        };

        let earlier = (required.start < existing.start)
            .then(|| YearRange::new(required.start, existing.start - 1));
        let later = (required.end > existing.end)
            .then(|| YearRange::new(existing.end + 1, required.end));

        match (earlier, later) {
            (None, None) => CalendarPlan::UpToDate,
            (Some(earlier), None) => CalendarPlan::NeedsEarlierYears(earlier),
            (None, Some(later)) => CalendarPlan::NeedsLaterYears(later),
            (Some(earlier), Some(later)) => CalendarPlan::NeedsBoth { earlier, later },
        }
    }

    /// Year ranges that must be fetched, in chronological order.
    pub fn fetch_ranges(&self) -> Vec<YearRange> {
        match self {
            CalendarPlan::UpToDate => Vec::new(),
            CalendarPlan::NeedsEarlierYears(range) | CalendarPlan::NeedsLaterYears(range) => {
                vec![*range]
            }
            CalendarPlan::NeedsBoth { earlier, later } => vec![*earlier, *later],
        }
    }
}
