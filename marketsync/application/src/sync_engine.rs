use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use marketsync_domain::{DateRange, Frequency, SyncState, SyncStatus};
use shaku::{Component, Interface};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SyncConfig};
use crate::ports::{
    BarProcessor, CalendarError, InstrumentUniverse, ProcessError, RecordStore, StatusError,
    StoreError, SyncStatusRepository,
};
use crate::report::{RangeSyncResult, SymbolError, SyncStats, SyncedRange};

/// Minimal date range needing re-fetch for one (symbol, frequency).
/// `start == None` means the key is already current, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRange {
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Synced,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SyncProgress {
    pub symbol: String,
    pub frequency: Frequency,
    pub completed: usize,
    pub total: usize,
    pub kind: ProgressKind,
}

pub type ProgressFn = Arc<dyn Fn(&SyncProgress) + Send + Sync>;

#[async_trait]
pub trait IncrementalSyncEngine: Interface {
    async fn calculate_sync_range(
        &self,
        symbol: &str,
        target_date: NaiveDate,
        frequency: Frequency,
    ) -> Result<SyncRange, SyncError>;

    /// Delegates fetch+transform+write for the whole span in one call.
    async fn sync_symbol_range(
        &self,
        symbol: &str,
        range: DateRange,
        frequency: Frequency,
    ) -> Result<RangeSyncResult, SyncError>;

    /// Syncs every (symbol, frequency) pair under the configured
    /// execution strategy. Per-instrument failures are counted, never
    /// propagated.
    async fn sync_all_symbols(
        &self,
        target_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
        progress: Option<ProgressFn>,
    ) -> Result<SyncStats, SyncError>;
}

#[derive(Component)]
#[shaku(interface = IncrementalSyncEngine)]
pub struct IncrementalSyncEngineImpl {
    #[shaku(inject)]
    store: Arc<dyn RecordStore>,

    #[shaku(inject)]
    processor: Arc<dyn BarProcessor>,

    #[shaku(inject)]
    status_repo: Arc<dyn SyncStatusRepository>,

    #[shaku(inject)]
    universe: Arc<dyn InstrumentUniverse>,

    config: SyncConfig,
}

#[derive(Debug)]
enum TaskResult {
    Synced { range: DateRange, synced_days: usize },
    Skipped,
    Failed { message: String },
}

#[derive(Debug)]
struct SymbolOutcome {
    symbol: String,
    frequency: Frequency,
    result: TaskResult,
}

impl IncrementalSyncEngineImpl {
    pub fn new(
        store: Arc<dyn RecordStore>,
        processor: Arc<dyn BarProcessor>,
        status_repo: Arc<dyn SyncStatusRepository>,
        universe: Arc<dyn InstrumentUniverse>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            processor,
            status_repo,
            universe,
            config,
        }
    }

    /// Runs one instrument end to end, converting every failure into a
    /// counted outcome so the batch never aborts.
    async fn run_one(
        &self,
        symbol: &str,
        frequency: Frequency,
        target_date: NaiveDate,
    ) -> SymbolOutcome {
        let result = match self.try_sync_symbol(symbol, frequency, target_date).await {
            Ok(result) => result,
            Err(e) => {
                warn!(symbol, frequency = %frequency, error = %e, "instrument sync failed");
                TaskResult::Failed {
                    message: e.to_string(),
                }
            }
        };

        if let Err(e) = self
            .persist_status(symbol, frequency, target_date, &result)
            .await
        {
            warn!(symbol, frequency = %frequency, error = %e, "sync status update failed");
        }

        SymbolOutcome {
            symbol: symbol.to_string(),
            frequency,
            result,
        }
    }

    async fn try_sync_symbol(
        &self,
        symbol: &str,
        frequency: Frequency,
        target_date: NaiveDate,
    ) -> Result<TaskResult, SyncError> {
        let sync_range = self
            .calculate_sync_range(symbol, target_date, frequency)
            .await?;

        let Some(start) = sync_range.start else {
            debug!(symbol, frequency = %frequency, "already current, skipping");
            return Ok(TaskResult::Skipped);
        };

        let span = DateRange::new(start, sync_range.end).expect("sync range must be ordered");
        let result = self.sync_symbol_range(symbol, span, frequency).await?;

        if result.success_count == 0 && result.error_count > 0 {
            return Ok(TaskResult::Failed {
                message: format!("{} dates failed to process", result.error_count),
            });
        }

        Ok(TaskResult::Synced {
            range: span,
            synced_days: result.success_count,
        })
    }

    /// Explicit symbol lists must name listed instruments; an unknown
    /// symbol is a bad request, not a sync failure.
    async fn resolve_symbols(
        &self,
        symbols: Option<Vec<String>>,
    ) -> Result<Vec<String>, SyncError> {
        let active = self
            .universe
            .active_symbols()
            .await
            .map_err(|e| SyncError::Universe(e.to_string()))?;

        match symbols {
            Some(symbols) => {
                let known: HashSet<String> = active.into_iter().collect();
                if let Some(unknown) = symbols.iter().find(|s| !known.contains(s.as_str())) {
                    return Err(ConfigError::UnknownSymbol(unknown.clone()).into());
                }
                Ok(symbols)
            }
            None => Ok(active),
        }
    }

    async fn persist_status(
        &self,
        symbol: &str,
        frequency: Frequency,
        target_date: NaiveDate,
        result: &TaskResult,
    ) -> Result<(), StatusError> {
        let (state, error_message, synced_days) = match result {
            TaskResult::Synced { synced_days, .. } => (SyncState::Completed, None, *synced_days),
            TaskResult::Skipped => (SyncState::Completed, None, 0),
            TaskResult::Failed { message } => (SyncState::Failed, Some(message.clone()), 0),
        };

        let last_data_date = self.store.max_date(symbol, frequency).await.ok().flatten();
        let prev_total = self
            .status_repo
            .get(symbol, frequency)
            .await?
            .map(|s| s.total_records)
            .unwrap_or(0);

        self.status_repo
            .upsert(&SyncStatus {
                symbol: symbol.to_string(),
                frequency,
                last_sync_date: target_date,
                last_data_date,
                state,
                error_message,
                total_records: prev_total + synced_days as u64,
                updated_at: Utc::now(),
            })
            .await
    }
}

#[async_trait]
impl IncrementalSyncEngine for IncrementalSyncEngineImpl {
    async fn calculate_sync_range(
        &self,
        symbol: &str,
        target_date: NaiveDate,
        frequency: Frequency,
    ) -> Result<SyncRange, SyncError> {
        if !self.config.frequencies.contains(&frequency) {
            return Err(ConfigError::UnsupportedFrequency(frequency).into());
        }

        // Future targets are clamped; the store can never run ahead of
        // the wall clock.
        let today = Utc::now().date_naive();
        let target = target_date.min(today);

        match self.store.max_date(symbol, frequency).await? {
            None => {
                let window_floor = target
                    .checked_sub_days(Days::new(self.config.max_sync_days as u64))
                    .unwrap_or(self.config.default_start_date);
                let start = self.config.default_start_date.max(window_floor);

                if start > target {
                    return Ok(SyncRange {
                        start: None,
                        end: target,
                    });
                }

                debug!(symbol, %start, %target, "first-time sync range");
                Ok(SyncRange {
                    start: Some(start),
                    end: target,
                })
            }
            Some(last_data_date) => {
                let start = last_data_date.checked_add_days(Days::new(1));
                match start {
                    Some(start) if start <= target => Ok(SyncRange {
                        start: Some(start),
                        end: target,
                    }),
                    _ => Ok(SyncRange {
                        start: None,
                        end: target,
                    }),
                }
            }
        }
    }

    async fn sync_symbol_range(
        &self,
        symbol: &str,
        range: DateRange,
        frequency: Frequency,
    ) -> Result<RangeSyncResult, SyncError> {
        info!(symbol, %range, frequency = %frequency, "syncing instrument range");

        let outcome = match tokio::time::timeout(
            self.config.task_timeout,
            self.processor.process(symbol, range, frequency),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProcessError::Transient(format!(
                    "processing timed out after {:?}",
                    self.config.task_timeout
                ))
                .into())
            }
        };

        debug!(
            symbol,
            processed = outcome.processed_dates.len(),
            failed = outcome.failed_dates.len(),
            "range processing finished"
        );

        Ok(RangeSyncResult {
            symbol: symbol.to_string(),
            frequency,
            range,
            success_count: outcome.processed_dates.len(),
            error_count: outcome.failed_dates.len(),
            synced_dates: outcome.processed_dates.into_iter().collect(),
        })
    }

    async fn sync_all_symbols(
        &self,
        target_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
        progress: Option<ProgressFn>,
    ) -> Result<SyncStats, SyncError> {
        let frequencies = frequencies.unwrap_or_else(|| self.config.frequencies.clone());
        for frequency in &frequencies {
            if !self.config.frequencies.contains(frequency) {
                return Err(ConfigError::UnsupportedFrequency(*frequency).into());
            }
        }

        let symbols = self.resolve_symbols(symbols).await?;

        let tasks: Vec<(String, Frequency)> = frequencies
            .iter()
            .flat_map(|frequency| {
                symbols
                    .iter()
                    .map(move |symbol| (symbol.clone(), *frequency))
            })
            .collect();

        let (batch_size, workers) = self.config.pool_shape();
        info!(
            %target_date,
            tasks = tasks.len(),
            mode = ?self.config.mode,
            workers,
            "starting incremental sync"
        );

        // All counters flow through this one collector; worker results
        // are folded in as they complete, whatever the submission order.
        let mut stats = SyncStats {
            total_symbols: tasks.len(),
            ..SyncStats::default()
        };
        let mut completed = 0usize;

        for batch in tasks.chunks(batch_size) {
            let mut results = stream::iter(batch.iter().cloned().map(|(symbol, frequency)| {
                async move { self.run_one(&symbol, frequency, target_date).await }.boxed()
            }))
            .buffer_unordered(workers);

            while let Some(outcome) = results.next().await {
                completed += 1;
                let (symbol, frequency, kind) = apply_outcome(&mut stats, outcome);
                if let Some(callback) = &progress {
                    callback(&SyncProgress {
                        symbol,
                        frequency,
                        completed,
                        total: stats.total_symbols,
                        kind,
                    });
                }
            }
        }

        info!(
            success = stats.success_count,
            errors = stats.error_count,
            skipped = stats.skipped_count,
            "incremental sync finished"
        );

        Ok(stats)
    }
}

fn apply_outcome(stats: &mut SyncStats, outcome: SymbolOutcome) -> (String, Frequency, ProgressKind) {
    let kind = match outcome.result {
        TaskResult::Synced { range, synced_days } => {
            stats.success_count += 1;
            stats.synced_ranges.insert(
                format!("{}:{}", outcome.symbol, outcome.frequency),
                SyncedRange {
                    start: range.start(),
                    end: range.end(),
                    synced_days,
                },
            );
            ProgressKind::Synced
        }
        TaskResult::Skipped => {
            stats.skipped_count += 1;
            ProgressKind::Skipped
        }
        TaskResult::Failed { message } => {
            stats.error_count += 1;
            stats.errors.push(SymbolError {
                symbol: outcome.symbol.clone(),
                frequency: outcome.frequency,
                message,
            });
            ProgressKind::Failed
        }
    };

    (outcome.symbol, outcome.frequency, kind)
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("sync status error: {0}")]
    Status(#[from] StatusError),

    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Gap(#[from] crate::gap_detection::GapError),

    #[error(transparent)]
    Validation(#[from] crate::validation::ValidationError),

    #[error("instrument universe unavailable: {0}")]
    Universe(String),
}
