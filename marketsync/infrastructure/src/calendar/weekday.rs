use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use marketsync_application::{CalendarError, CalendarFeed, CalendarOracle};
use marketsync_domain::{CalendarDay, DateRange, YearRange};
use shaku::Component;
use tracing::info;

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Mock calendar oracle treating every weekday as a trading day,
/// regardless of market. Holidays need a real calendar source.
#[derive(Component, Default)]
#[shaku(interface = CalendarOracle)]
pub struct WeekdayCalendar {}

#[async_trait]
impl CalendarOracle for WeekdayCalendar {
    async fn trading_days(
        &self,
        _market: &str,
        range: DateRange,
    ) -> Result<Vec<NaiveDate>, CalendarError> {
        Ok(range.iter_days().filter(|&date| is_weekday(date)).collect())
    }

    async fn is_trading_day(&self, _market: &str, date: NaiveDate) -> Result<bool, CalendarError> {
        Ok(is_weekday(date))
    }
}

/// Mock upstream calendar source; emits one entry per day of the
/// requested years with weekday trading flags.
#[derive(Component, Default)]
#[shaku(interface = CalendarFeed)]
pub struct WeekdayCalendarFeed {}

#[async_trait]
impl CalendarFeed for WeekdayCalendarFeed {
    async fn fetch_years(
        &self,
        market: &str,
        years: YearRange,
    ) -> Result<Vec<CalendarDay>, CalendarError> {
        info!(market, ?years, "generating weekday calendar years");

        let start = NaiveDate::from_ymd_opt(years.start, 1, 1).ok_or_else(|| {
            CalendarError::Backend(format!("year {} out of range", years.start))
        })?;
        let end = NaiveDate::from_ymd_opt(years.end, 12, 31).ok_or_else(|| {
            CalendarError::Backend(format!("year {} out of range", years.end))
        })?;
        let range = DateRange::new(start, end)
            .map_err(|e| CalendarError::Backend(e.to_string()))?;

        Ok(range
            .iter_days()
            .map(|date| CalendarDay {
                date,
                market: market.to_string(),
                is_trading: is_weekday(date),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn weekends_are_not_trading_days() {
        let calendar = WeekdayCalendar::default();
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 23).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();

        assert!(!calendar.is_trading_day("CN", saturday).await.unwrap());
        assert!(calendar.is_trading_day("CN", monday).await.unwrap());
    }

    #[tokio::test]
    async fn feed_covers_whole_years() {
        let feed = WeekdayCalendarFeed::default();
        let days = feed
            .fetch_years("CN", YearRange::new(2024, 2024))
            .await
            .unwrap();

        assert_eq!(days.len(), 366); // leap year
        assert!(days.iter().all(|day| day.market == "CN"));
        assert!(days.iter().any(|day| !day.is_trading));
    }
}
