use chrono::NaiveDate;
use marketsync_domain::Frequency;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How per-instrument sync tasks are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// One instrument at a time. Required when the upstream source
    /// forbids concurrent requests.
    Sequential,
    /// Fixed-size batches on a bounded worker pool.
    BoundedParallel,
    /// Smaller sub-batches with a lower worker cap, trading throughput
    /// for bounded peak resource use.
    Pipelined,
}

/// Explicit configuration handed to every component constructor.
/// There is no ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub market: String,
    pub frequencies: Vec<Frequency>,
    /// Dataset floor: first-time syncs never reach back past this date.
    pub default_start_date: NaiveDate,
    /// First-time syncs are also capped to this many days before target.
    pub max_sync_days: u32,
    pub mode: SyncMode,
    pub batch_size: usize,
    pub max_workers: usize,
    pub pipeline_batch_size: usize,
    pub pipeline_max_workers: usize,
    /// Passed through to the fetch collaborator when awaiting a worker.
    #[serde(skip)]
    pub task_timeout: Duration,
    /// Trailing window scanned by the gap-detection phase.
    pub gap_scan_days: u32,
    /// Trailing window scanned by the validation phase.
    pub validation_days: u32,
    /// Gaps spanning more trading days than this are reported, never
    /// auto-repaired.
    pub max_repair_days: u32,
    pub auto_repair: bool,
    pub enable_validation: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            market: "CN".to_string(),
            frequencies: vec![Frequency::Daily],
            default_start_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
            max_sync_days: 30,
            mode: SyncMode::Sequential,
            batch_size: 50,
            max_workers: 3,
            pipeline_batch_size: 5,
            pipeline_max_workers: 2,
            task_timeout: Duration::from_secs(120),
            gap_scan_days: 30,
            validation_days: 7,
            max_repair_days: 7,
            auto_repair: true,
            enable_validation: true,
        }
    }
}

impl SyncConfig {
    /// (batch size, worker cap) for the configured mode. Sequential is a
    /// degenerate pool of one.
    pub fn pool_shape(&self) -> (usize, usize) {
        match self.mode {
            SyncMode::Sequential => (usize::MAX, 1),
            SyncMode::BoundedParallel => (self.batch_size.max(1), self.max_workers.max(1)),
            SyncMode::Pipelined => (
                self.pipeline_batch_size.max(1),
                self.pipeline_max_workers.max(1),
            ),
        }
    }
}

/// The request itself is invalid; raised immediately, never isolated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("frequency {0} is not configured for syncing")]
    UnsupportedFrequency(Frequency),

    #[error("unknown instrument: {0}")]
    UnknownSymbol(String),
}
