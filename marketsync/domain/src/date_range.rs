use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Shrinks the end of the range to `limit` if it extends past it.
    pub fn clamp_end(self, limit: NaiveDate) -> Self {
        Self {
            start: self.start,
            end: self.end.min(limit),
        }
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.checked_add_days(Days::new(1)).filter(|next| *next <= end)
        })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DateRangeError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn valid_range_counts_days() {
        let range = DateRange::new(d(1), d(10)).unwrap();
        assert_eq!(range.days(), 10);
        assert!(range.contains(d(5)));
        assert!(!range.contains(d(11)));
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(matches!(
            DateRange::new(d(10), d(1)),
            Err(DateRangeError::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn iter_days_covers_range_inclusive() {
        let range = DateRange::new(d(1), d(3)).unwrap();
        let days: Vec<NaiveDate> = range.iter_days().collect();
        assert_eq!(days, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn clamp_end_only_shrinks() {
        let range = DateRange::new(d(1), d(10)).unwrap();
        assert_eq!(range.clamp_end(d(5)).end(), d(5));
        assert_eq!(range.clamp_end(d(20)).end(), d(10));
    }
}
