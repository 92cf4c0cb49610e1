use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use marketsync_application::{
    BarProcessor, ExtendedDataGateway, ExtendedOutcome, ProcessError, ProcessOutcome, RecordStore,
};
use marketsync_domain::{Bar, DateRange, Frequency};
use rand::Rng;
use rust_decimal::Decimal;
use shaku::Component;
use tracing::info;

fn default_base_price() -> f64 {
    10.0
}

/// Mock fetch+transform+write collaborator. Generates a random walk of
/// plausible bars for every weekday in the range and writes them through
/// the record store.
#[derive(Component)]
#[shaku(interface = BarProcessor)]
pub struct MockBarProcessor {
    #[shaku(inject)]
    store: Arc<dyn RecordStore>,

    #[shaku(default = default_base_price())]
    base_price: f64,

    /// Symbols that fail with a transient error instead of producing
    /// bars.
    #[shaku(default)]
    fail_symbols: HashSet<String>,
}

impl MockBarProcessor {
    pub fn new(
        store: Arc<dyn RecordStore>,
        base_price: f64,
        fail_symbols: HashSet<String>,
    ) -> Self {
        Self {
            store,
            base_price,
            fail_symbols,
        }
    }

    fn generate_bar(&self, symbol: &str, date: NaiveDate, frequency: Frequency) -> Bar {
        let mut rng = rand::rng();

        let open = self.base_price + rng.random_range(-2.0..2.0);
        let close = open + rng.random_range(-1.0..1.0);
        let high = open.max(close) + rng.random_range(0.0..0.5);
        let low = open.min(close) - rng.random_range(0.0..0.5);
        let volume = rng.random_range(10_000..500_000);

        Bar {
            symbol: symbol.to_string(),
            date,
            frequency,
            open: to_decimal(open),
            high: to_decimal(high),
            low: to_decimal(low),
            close: to_decimal(close),
            volume,
            turnover: to_decimal(close) * Decimal::from(volume),
        }
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).expect("mock price is finite")
}

#[async_trait]
impl BarProcessor for MockBarProcessor {
    async fn process(
        &self,
        symbol: &str,
        range: DateRange,
        frequency: Frequency,
    ) -> Result<ProcessOutcome, ProcessError> {
        if self.fail_symbols.contains(symbol) {
            return Err(ProcessError::Transient(format!(
                "mock upstream refused {symbol}"
            )));
        }

        info!(symbol, %range, frequency = %frequency, "mock processor generating bars");

        let dates: Vec<NaiveDate> = range
            .iter_days()
            .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();

        let bars: Vec<Bar> = dates
            .iter()
            .map(|&date| self.generate_bar(symbol, date, frequency))
            .collect();

        self.store
            .upsert_range(bars)
            .await
            .map_err(|e| ProcessError::Transient(e.to_string()))?;

        Ok(ProcessOutcome {
            processed_dates: dates.into_iter().collect(),
            failed_dates: BTreeSet::new(),
        })
    }
}

/// Mock source of the secondary per-instrument datasets.
#[derive(Component, Default)]
#[shaku(interface = ExtendedDataGateway)]
pub struct MockExtendedDataGateway {}

#[async_trait]
impl ExtendedDataGateway for MockExtendedDataGateway {
    async fn sync_extended(
        &self,
        symbol: &str,
        _target_date: NaiveDate,
    ) -> Result<ExtendedOutcome, ProcessError> {
        let mut rng = rand::rng();
        let outcome = ExtendedOutcome {
            financial_rows: rng.random_range(1..10),
            valuation_rows: rng.random_range(1..10),
            indicator_rows: rng.random_range(1..30),
        };
        info!(symbol, ?outcome, "mock extended data generated");
        Ok(outcome)
    }
}
