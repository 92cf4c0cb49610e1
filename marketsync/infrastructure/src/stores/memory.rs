use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use marketsync_application::{RecordStore, StoreError};
use marketsync_domain::{Bar, DateRange, Frequency};
use shaku::Component;
use tokio::sync::RwLock;

type BarsByKey = BTreeMap<(String, Frequency), BTreeMap<NaiveDate, Bar>>;

/// Record store backed by process memory. Safe for concurrent workers;
/// contents do not survive a restart.
#[derive(Component, Default)]
#[shaku(interface = RecordStore)]
pub struct InMemoryRecordStore {
    #[shaku(default)]
    bars: RwLock<BarsByKey>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn max_date(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<NaiveDate>, StoreError> {
        let bars = self.bars.read().await;
        Ok(bars
            .get(&(symbol.to_string(), frequency))
            .and_then(|dates| dates.keys().next_back().copied()))
    }

    async fn stored_dates(
        &self,
        symbol: &str,
        frequency: Frequency,
        range: DateRange,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        let bars = self.bars.read().await;
        Ok(bars
            .get(&(symbol.to_string(), frequency))
            .map(|dates| {
                dates
                    .keys()
                    .copied()
                    .filter(|date| range.contains(*date))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read_range(
        &self,
        symbol: &str,
        frequency: Frequency,
        range: DateRange,
    ) -> Result<Vec<Bar>, StoreError> {
        let bars = self.bars.read().await;
        Ok(bars
            .get(&(symbol.to_string(), frequency))
            .map(|dates| {
                dates
                    .values()
                    .filter(|bar| range.contains(bar.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_range(&self, new_bars: Vec<Bar>) -> Result<usize, StoreError> {
        let mut bars = self.bars.write().await;
        let count = new_bars.len();
        for bar in new_bars {
            bars.entry((bar.symbol.clone(), bar.frequency))
                .or_default()
                .insert(bar.date, bar);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(symbol: &str, date: NaiveDate, close: rust_decimal::Decimal) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            date,
            frequency: Frequency::Daily,
            open: dec!(10.0),
            high: dec!(12.0),
            low: dec!(9.0),
            close,
            volume: 1_000,
            turnover: dec!(10500.0),
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_keys() {
        let store = InMemoryRecordStore::new();
        store.upsert_range(vec![bar("AAA", d(2), dec!(11.0))]).await.unwrap();
        store.upsert_range(vec![bar("AAA", d(2), dec!(11.5))]).await.unwrap();

        let range = DateRange::new(d(1), d(5)).unwrap();
        let bars = store.read_range("AAA", Frequency::Daily, range).await.unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, dec!(11.5));
    }

    #[tokio::test]
    async fn max_date_tracks_the_latest_record() {
        let store = InMemoryRecordStore::new();
        assert_eq!(store.max_date("AAA", Frequency::Daily).await.unwrap(), None);

        store
            .upsert_range(vec![bar("AAA", d(3), dec!(11.0)), bar("AAA", d(9), dec!(11.0))])
            .await
            .unwrap();
        assert_eq!(
            store.max_date("AAA", Frequency::Daily).await.unwrap(),
            Some(d(9))
        );
    }

    #[tokio::test]
    async fn stored_dates_respects_the_requested_range() {
        let store = InMemoryRecordStore::new();
        store
            .upsert_range(vec![
                bar("AAA", d(2), dec!(11.0)),
                bar("AAA", d(5), dec!(11.0)),
                bar("AAA", d(20), dec!(11.0)),
            ])
            .await
            .unwrap();

        let range = DateRange::new(d(1), d(10)).unwrap();
        let dates = store.stored_dates("AAA", Frequency::Daily, range).await.unwrap();
        assert_eq!(dates, BTreeSet::from([d(2), d(5)]));
    }

    #[tokio::test]
    async fn keys_are_isolated_per_frequency() {
        let store = InMemoryRecordStore::new();
        store.upsert_range(vec![bar("AAA", d(2), dec!(11.0))]).await.unwrap();

        assert_eq!(store.max_date("AAA", Frequency::Min5).await.unwrap(), None);
    }
}
