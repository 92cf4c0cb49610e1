use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use marketsync_application::{CalendarError, CalendarRepository};
use marketsync_domain::{CalendarDay, YearRange};
use shaku::Component;
use tokio::sync::RwLock;
use tracing::debug;

type DaysByMarket = BTreeMap<String, BTreeMap<NaiveDate, CalendarDay>>;

/// Calendar store backed by process memory. Starts empty, so the first
/// base-data refresh fetches the full buffered year range.
#[derive(Component, Default)]
#[shaku(interface = CalendarRepository)]
pub struct InMemoryCalendarRepository {
    #[shaku(default)]
    days: RwLock<DaysByMarket>,
}

impl InMemoryCalendarRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CalendarRepository for InMemoryCalendarRepository {
    async fn coverage(&self, market: &str) -> Result<Option<YearRange>, CalendarError> {
        let days = self.days.read().await;
        let Some(entries) = days.get(market) else {
            return Ok(None);
        };

        let first = entries.keys().next();
        let last = entries.keys().next_back();
        Ok(match (first, last) {
            (Some(first), Some(last)) => Some(YearRange::new(first.year(), last.year())),
            _ => None,
        })
    }

    async fn upsert_days(&self, new_days: Vec<CalendarDay>) -> Result<usize, CalendarError> {
        let mut days = self.days.write().await;
        let count = new_days.len();
        for day in new_days {
            days.entry(day.market.clone())
                .or_default()
                .insert(day.date, day);
        }
        debug!(count, "calendar days upserted");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> CalendarDay {
        CalendarDay {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            market: "CN".to_string(),
            is_trading: true,
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_coverage() {
        let repo = InMemoryCalendarRepository::new();
        assert_eq!(repo.coverage("CN").await.unwrap(), None);
    }

    #[tokio::test]
    async fn coverage_spans_min_to_max_year() {
        let repo = InMemoryCalendarRepository::new();
        repo.upsert_days(vec![day(2023, 6, 1), day(2025, 2, 3)])
            .await
            .unwrap();

        assert_eq!(
            repo.coverage("CN").await.unwrap(),
            Some(YearRange::new(2023, 2025))
        );
        // Another market is still empty.
        assert_eq!(repo.coverage("US").await.unwrap(), None);
    }
}
