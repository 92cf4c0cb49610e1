use async_trait::async_trait;
use chrono::NaiveDate;
use marketsync_domain::{Bar, CalendarDay, DateRange, Frequency, SyncStatus, YearRange};
use serde::{Deserialize, Serialize};
use shaku::Interface;
use std::collections::BTreeSet;

/// Authoritative "is date D a trading day for market M".
#[async_trait]
pub trait CalendarOracle: Interface {
    /// Ordered trading dates for the market within the range.
    async fn trading_days(
        &self,
        market: &str,
        range: DateRange,
    ) -> Result<Vec<NaiveDate>, CalendarError>;

    async fn is_trading_day(&self, market: &str, date: NaiveDate) -> Result<bool, CalendarError>;
}

/// Write side of the trading calendar, used only by the base-data
/// refresh phase.
#[async_trait]
pub trait CalendarRepository: Interface {
    /// Min/max year present for the market, `None` when empty.
    async fn coverage(&self, market: &str) -> Result<Option<YearRange>, CalendarError>;

    async fn upsert_days(&self, days: Vec<CalendarDay>) -> Result<usize, CalendarError>;
}

/// Upstream source of trading-calendar years.
#[async_trait]
pub trait CalendarFeed: Interface {
    async fn fetch_years(
        &self,
        market: &str,
        years: YearRange,
    ) -> Result<Vec<CalendarDay>, CalendarError>;
}

/// Keyed store of market records. Shared across workers; must tolerate
/// concurrent use.
#[async_trait]
pub trait RecordStore: Interface {
    async fn max_date(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<NaiveDate>, StoreError>;

    async fn stored_dates(
        &self,
        symbol: &str,
        frequency: Frequency,
        range: DateRange,
    ) -> Result<BTreeSet<NaiveDate>, StoreError>;

    async fn read_range(
        &self,
        symbol: &str,
        frequency: Frequency,
        range: DateRange,
    ) -> Result<Vec<Bar>, StoreError>;

    /// Idempotent: overwrites existing (symbol, date, frequency) keys.
    async fn upsert_range(&self, bars: Vec<Bar>) -> Result<usize, StoreError>;
}

/// Result of one fetch+transform+write unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub processed_dates: BTreeSet<NaiveDate>,
    pub failed_dates: BTreeSet<NaiveDate>,
}

/// Opaque fetch/transform/write collaborator, possibly slow or failing.
#[async_trait]
pub trait BarProcessor: Interface {
    async fn process(
        &self,
        symbol: &str,
        range: DateRange,
        frequency: Frequency,
    ) -> Result<ProcessOutcome, ProcessError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseUpdate {
    pub total_symbols: usize,
    pub added: usize,
    pub removed: usize,
}

#[async_trait]
pub trait InstrumentUniverse: Interface {
    async fn active_symbols(&self) -> Result<Vec<String>, UniverseError>;

    /// Re-pulls the instrument list from upstream.
    async fn refresh(&self) -> Result<UniverseUpdate, UniverseError>;
}

/// Persisted per-(symbol, frequency) sync bookkeeping.
#[async_trait]
pub trait SyncStatusRepository: Interface {
    async fn get(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<SyncStatus>, StatusError>;

    async fn upsert(&self, status: &SyncStatus) -> Result<(), StatusError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedOutcome {
    pub financial_rows: u64,
    pub valuation_rows: u64,
    pub indicator_rows: u64,
}

/// Per-instrument secondary datasets that depend on now-current market
/// data (financials, valuations, derived indicators).
#[async_trait]
pub trait ExtendedDataGateway: Interface {
    async fn sync_extended(
        &self,
        symbol: &str,
        target_date: NaiveDate,
    ) -> Result<ExtendedOutcome, ProcessError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("no calendar data for market {market} in {detail}")]
    Unavailable { market: String, detail: String },

    #[error("calendar backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("transient fetch failure: {0}")]
    Transient(String),

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UniverseError {
    #[error("instrument universe backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("sync status backend error: {0}")]
    Backend(String),
}
