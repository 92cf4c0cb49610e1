use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use marketsync_application::{
    BarProcessor, ConfigError, IncrementalSyncEngine, IncrementalSyncEngineImpl,
    InstrumentUniverse, ProcessError, ProcessOutcome, ProgressFn, RecordStore, StatusError,
    StoreError, SyncConfig, SyncError, SyncMode, SyncProgress, SyncStatusRepository,
    UniverseError, UniverseUpdate,
};
use marketsync_domain::{Bar, DateRange, Frequency, SyncState, SyncStatus};
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

#[tokio::test]
async fn first_sync_starts_at_configured_floor() {
    let fixture = Fixture::new(&["AAA"]);
    let engine = fixture.engine(test_config());

    let range = engine
        .calculate_sync_range("AAA", d(1, 15), Frequency::Daily)
        .await
        .unwrap();

    assert_eq!(range.start, Some(d(1, 1)));
    assert_eq!(range.end, d(1, 15));
}

#[tokio::test]
async fn first_sync_is_capped_to_the_lookback_window() {
    let fixture = Fixture::new(&["AAA"]);
    let mut config = test_config();
    config.default_start_date = d(1, 1);
    config.max_sync_days = 30;
    let engine = fixture.engine(config);

    // 30 days before 2024-03-01 is 2024-01-31, later than the floor.
    let range = engine
        .calculate_sync_range("AAA", d(3, 1), Frequency::Daily)
        .await
        .unwrap();

    assert_eq!(range.start, Some(d(1, 31)));
    assert_eq!(range.end, d(3, 1));
}

#[tokio::test]
async fn resume_starts_the_day_after_the_last_stored_date() {
    let fixture = Fixture::new(&["AAA"]);
    fixture.seed("AAA", &[d(1, 9), d(1, 10)]).await;
    let engine = fixture.engine(test_config());

    let range = engine
        .calculate_sync_range("AAA", d(1, 15), Frequency::Daily)
        .await
        .unwrap();

    assert_eq!(range.start, Some(d(1, 11)));
    assert_eq!(range.end, d(1, 15));
}

#[tokio::test]
async fn current_instrument_needs_no_sync() {
    let fixture = Fixture::new(&["AAA"]);
    fixture.seed("AAA", &[d(1, 15)]).await;
    let engine = fixture.engine(test_config());

    let range = engine
        .calculate_sync_range("AAA", d(1, 15), Frequency::Daily)
        .await
        .unwrap();

    assert_eq!(range.start, None);
    assert_eq!(range.end, d(1, 15));
}

#[tokio::test]
async fn unconfigured_frequency_is_rejected_up_front() {
    let fixture = Fixture::new(&["AAA"]);
    let engine = fixture.engine(test_config());

    let err = engine
        .calculate_sync_range("AAA", d(1, 15), Frequency::Min5)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Config(ConfigError::UnsupportedFrequency(Frequency::Min5))
    ));
}

#[tokio::test]
async fn one_failing_instrument_never_aborts_the_batch() {
    let fixture = Fixture::new(&["SYM1", "SYM2", "SYM3", "SYM4", "SYM5"]).failing(&["SYM3"]);
    let engine = fixture.engine(test_config());

    let stats = engine
        .sync_all_symbols(d(1, 15), None, None, None)
        .await
        .unwrap();

    assert_eq!(stats.total_symbols, 5);
    assert_eq!(stats.success_count, 4);
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.skipped_count, 0);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].symbol, "SYM3");

    // The failure is also visible in the persisted per-key status.
    let failed = fixture.status("SYM3").await.unwrap();
    assert_eq!(failed.state, SyncState::Failed);
    assert!(failed.error_message.is_some());

    let ok = fixture.status("SYM1").await.unwrap();
    assert_eq!(ok.state, SyncState::Completed);
    assert_eq!(ok.last_sync_date, d(1, 15));
    assert!(ok.error_message.is_none());
}

#[tokio::test]
async fn rerunning_a_current_fleet_skips_every_instrument() {
    let fixture = Fixture::new(&["AAA", "BBB"]);
    fixture.seed("AAA", &[d(1, 15)]).await;
    fixture.seed("BBB", &[d(1, 15)]).await;
    let engine = fixture.engine(test_config());

    let stats = engine
        .sync_all_symbols(d(1, 15), None, None, None)
        .await
        .unwrap();

    assert_eq!(stats.skipped_count, 2);
    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.error_count, 0);
    assert!(stats.synced_ranges.is_empty());

    // A skip still refreshes the bookkeeping row.
    let status = fixture.status("AAA").await.unwrap();
    assert_eq!(status.state, SyncState::Completed);
    assert_eq!(status.last_data_date, Some(d(1, 15)));
}

#[tokio::test]
async fn bounded_parallel_mode_produces_the_same_counts() {
    let fixture = Fixture::new(&["SYM1", "SYM2", "SYM3", "SYM4", "SYM5"]).failing(&["SYM2"]);
    let mut config = test_config();
    config.mode = SyncMode::BoundedParallel;
    config.batch_size = 2;
    config.max_workers = 2;
    let engine = fixture.engine(config);

    let stats = engine
        .sync_all_symbols(d(1, 15), None, None, None)
        .await
        .unwrap();

    assert_eq!(stats.total_symbols, 5);
    assert_eq!(stats.success_count, 4);
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.synced_ranges.len(), 4);
}

#[tokio::test]
async fn pipelined_mode_produces_the_same_counts() {
    let fixture = Fixture::new(&["SYM1", "SYM2", "SYM3", "SYM4", "SYM5"]).failing(&["SYM2"]);
    let mut config = test_config();
    config.mode = SyncMode::Pipelined;
    config.pipeline_batch_size = 2;
    config.pipeline_max_workers = 2;
    let engine = fixture.engine(config);

    let stats = engine
        .sync_all_symbols(d(1, 15), None, None, None)
        .await
        .unwrap();

    assert_eq!(stats.total_symbols, 5);
    assert_eq!(stats.success_count, 4);
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.synced_ranges.len(), 4);
}

#[tokio::test]
async fn unlisted_symbol_fails_the_whole_request() {
    let fixture = Fixture::new(&["AAA", "BBB"]);
    let engine = fixture.engine(test_config());

    let err = engine
        .sync_all_symbols(d(1, 15), Some(vec!["AAA".to_string(), "ZZZ".to_string()]), None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Config(ConfigError::UnknownSymbol(ref s)) if s == "ZZZ"
    ));
    // Nothing ran, not even for the listed symbol.
    assert!(fixture.status("AAA").await.is_none());
}

#[tokio::test]
async fn progress_callback_sees_every_instrument() {
    let fixture = Fixture::new(&["AAA", "BBB", "CCC"]);
    let engine = fixture.engine(test_config());

    let seen: Arc<std::sync::Mutex<Vec<SyncProgress>>> = Arc::new(std::sync::Mutex::new(vec![]));
    let sink = seen.clone();
    let progress: ProgressFn = Arc::new(move |p: &SyncProgress| {
        sink.lock().unwrap().push(p.clone());
    });

    engine
        .sync_all_symbols(d(1, 15), None, None, Some(progress))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    let completed: BTreeSet<usize> = seen.iter().map(|p| p.completed).collect();
    assert_eq!(completed, BTreeSet::from([1, 2, 3]));
    assert!(seen.iter().all(|p| p.total == 3));
}

fn test_config() -> SyncConfig {
    SyncConfig {
        default_start_date: d(1, 1),
        ..SyncConfig::default()
    }
}

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn make_bar(symbol: &str, date: NaiveDate) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        date,
        frequency: Frequency::Daily,
        open: dec!(10.0),
        high: dec!(12.0),
        low: dec!(9.0),
        close: dec!(11.0),
        volume: 1_000,
        turnover: dec!(10500.0),
    }
}

struct Fixture {
    store: Arc<InMemoryBarStore>,
    processor: Arc<StubProcessor>,
    status_repo: Arc<RecordingStatusRepo>,
    universe: Arc<StaticUniverse>,
}

impl Fixture {
    fn new(symbols: &[&str]) -> Self {
        Self {
            store: Arc::new(InMemoryBarStore::default()),
            processor: Arc::new(StubProcessor::default()),
            status_repo: Arc::new(RecordingStatusRepo::default()),
            universe: Arc::new(StaticUniverse {
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn failing(mut self, symbols: &[&str]) -> Self {
        self.processor = Arc::new(StubProcessor {
            fail_symbols: symbols.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    fn engine(&self, config: SyncConfig) -> IncrementalSyncEngineImpl {
        IncrementalSyncEngineImpl::new(
            self.store.clone(),
            self.processor.clone(),
            self.status_repo.clone(),
            self.universe.clone(),
            config,
        )
    }

    async fn seed(&self, symbol: &str, dates: &[NaiveDate]) {
        let bars = dates.iter().map(|&date| make_bar(symbol, date)).collect();
        self.store.upsert_range(bars).await.unwrap();
    }

    async fn status(&self, symbol: &str) -> Option<SyncStatus> {
        self.status_repo
            .get(symbol, Frequency::Daily)
            .await
            .unwrap()
    }
}

#[derive(Default)]
struct InMemoryBarStore {
    bars: Mutex<BTreeMap<(String, Frequency), BTreeMap<NaiveDate, Bar>>>,
}

#[async_trait]
impl RecordStore for InMemoryBarStore {
    async fn max_date(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<NaiveDate>, StoreError> {
        let bars = self.bars.lock().await;
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
        let bars = self.bars.lock().await;
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
        let bars = self.bars.lock().await;
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
        let mut bars = self.bars.lock().await;
        let count = new_bars.len();
        for bar in new_bars {
            bars.entry((bar.symbol.clone(), bar.frequency))
                .or_default()
                .insert(bar.date, bar);
        }
        Ok(count)
    }
}

#[derive(Default)]
struct StubProcessor {
    fail_symbols: HashSet<String>,
}

#[async_trait]
impl BarProcessor for StubProcessor {
    async fn process(
        &self,
        symbol: &str,
        range: DateRange,
        _frequency: Frequency,
    ) -> Result<ProcessOutcome, ProcessError> {
        if self.fail_symbols.contains(symbol) {
            return Err(ProcessError::Transient("upstream refused".to_string()));
        }
        Ok(ProcessOutcome {
            processed_dates: range.iter_days().collect(),
            failed_dates: BTreeSet::new(),
        })
    }
}

#[derive(Default)]
struct RecordingStatusRepo {
    states: Mutex<HashMap<(String, Frequency), SyncStatus>>,
}

#[async_trait]
impl SyncStatusRepository for RecordingStatusRepo {
    async fn get(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<SyncStatus>, StatusError> {
        Ok(self
            .states
            .lock()
            .await
            .get(&(symbol.to_string(), frequency))
            .cloned())
    }

    async fn upsert(&self, status: &SyncStatus) -> Result<(), StatusError> {
        self.states
            .lock()
            .await
            .insert((status.symbol.clone(), status.frequency), status.clone());
        Ok(())
    }
}

struct StaticUniverse {
    symbols: Vec<String>,
}

#[async_trait]
impl InstrumentUniverse for StaticUniverse {
    async fn active_symbols(&self) -> Result<Vec<String>, UniverseError> {
        Ok(self.symbols.clone())
    }

    async fn refresh(&self) -> Result<UniverseUpdate, UniverseError> {
        Ok(UniverseUpdate {
            total_symbols: self.symbols.len(),
            added: 0,
            removed: 0,
        })
    }
}
