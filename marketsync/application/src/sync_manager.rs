use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Utc};
use marketsync_domain::{CalendarPlan, Frequency};
use shaku::{Component, Interface};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{ConfigError, SyncConfig};
use crate::gap_detection::GapDetectionService;
use crate::ports::{
    CalendarFeed, CalendarRepository, ExtendedDataGateway, InstrumentUniverse,
};
use crate::report::{
    CalendarUpdate, ExtendedStats, GapReport, PhaseOutcome, Phases, RepairDetail, RepairStats,
    SyncReport, ValidationReport,
};
use crate::sync_engine::{IncrementalSyncEngine, SyncError};
use crate::validation::ValidationService;

/// Drives the fixed phase sequence: base-data refresh, incremental sync,
/// extended-data sync, gap detection + auto-repair, validation. Every
/// phase records its own outcome; one phase failing never blocks the
/// next.
#[async_trait]
pub trait SyncManager: Interface {
    async fn run_full_sync(
        &self,
        target_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<SyncReport, SyncError>;

    /// Stand-alone gap detection with auto-repair of small gaps.
    async fn detect_and_repair_gaps(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<(GapReport, Option<RepairStats>), SyncError>;

    /// Stand-alone validation pass.
    async fn run_validation(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<ValidationReport, SyncError>;
}

#[derive(Component)]
#[shaku(interface = SyncManager)]
pub struct SyncManagerImpl {
    #[shaku(inject)]
    engine: Arc<dyn IncrementalSyncEngine>,

    #[shaku(inject)]
    gap_service: Arc<dyn GapDetectionService>,

    #[shaku(inject)]
    validator: Arc<dyn ValidationService>,

    #[shaku(inject)]
    calendar_repo: Arc<dyn CalendarRepository>,

    #[shaku(inject)]
    calendar_feed: Arc<dyn CalendarFeed>,

    #[shaku(inject)]
    universe: Arc<dyn InstrumentUniverse>,

    #[shaku(inject)]
    extended: Arc<dyn ExtendedDataGateway>,

    config: SyncConfig,
}

impl SyncManagerImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<dyn IncrementalSyncEngine>,
        gap_service: Arc<dyn GapDetectionService>,
        validator: Arc<dyn ValidationService>,
        calendar_repo: Arc<dyn CalendarRepository>,
        calendar_feed: Arc<dyn CalendarFeed>,
        universe: Arc<dyn InstrumentUniverse>,
        extended: Arc<dyn ExtendedDataGateway>,
        config: SyncConfig,
    ) -> Self {
        Self {
            engine,
            gap_service,
            validator,
            calendar_repo,
            calendar_feed,
            universe,
            extended,
            config,
        }
    }

    /// Compares stored calendar coverage against target_year ± 1 and
    /// fetches only the year ranges not already covered.
    async fn update_trading_calendar(
        &self,
        target_date: NaiveDate,
    ) -> Result<CalendarUpdate, SyncError> {
        let market = self.config.market.as_str();
        let coverage = self.calendar_repo.coverage(market).await?;
        let plan = CalendarPlan::plan(coverage, target_date.year());

        let fetched_ranges = plan.fetch_ranges();
        let mut updated_records = 0;

        for years in &fetched_ranges {
            let days = self.calendar_feed.fetch_years(market, *years).await?;
            updated_records += self.calendar_repo.upsert_days(days).await?;
        }

        if fetched_ranges.is_empty() {
            info!(market, year = target_date.year(), "trading calendar already covers target");
        } else {
            info!(market, ?fetched_ranges, updated_records, "trading calendar extended");
        }

        Ok(CalendarUpdate {
            market: market.to_string(),
            fetched_ranges,
            updated_records,
        })
    }

    async fn sync_extended_data(
        &self,
        symbols: &[String],
        target_date: NaiveDate,
    ) -> ExtendedStats {
        let mut stats = ExtendedStats::default();

        for symbol in symbols {
            match self.extended.sync_extended(symbol, target_date).await {
                Ok(outcome) => {
                    stats.processed_symbols += 1;
                    stats.totals.financial_rows += outcome.financial_rows;
                    stats.totals.valuation_rows += outcome.valuation_rows;
                    stats.totals.indicator_rows += outcome.indicator_rows;
                }
                Err(e) => {
                    warn!(symbol, error = %e, "extended data sync failed");
                    stats.failed_symbols += 1;
                }
            }
        }

        stats
    }

    /// Repairs gaps at or below the configured span cap by re-syncing
    /// exactly the gap interval. Larger gaps are counted and left for a
    /// deliberate backfill.
    async fn repair_gaps(&self, report: &GapReport) -> RepairStats {
        let mut stats = RepairStats {
            total_gaps: report.summary.total_gaps,
            ..RepairStats::default()
        };

        for freq_gaps in &report.by_frequency {
            for gap in &freq_gaps.gaps {
                if gap.trading_days() > self.config.max_repair_days {
                    info!(
                        symbol = gap.symbol(),
                        range = %gap.range(),
                        trading_days = gap.trading_days(),
                        "gap exceeds repair cap, reporting only"
                    );
                    stats.skipped_too_large += 1;
                    continue;
                }

                stats.attempted += 1;
                let repaired = match self
                    .engine
                    .sync_symbol_range(gap.symbol(), gap.range(), gap.frequency())
                    .await
                {
                    Ok(result) => result.success_count > 0,
                    Err(e) => {
                        warn!(symbol = gap.symbol(), range = %gap.range(), error = %e, "gap repair failed");
                        false
                    }
                };

                if repaired {
                    stats.repaired += 1;
                } else {
                    stats.failed += 1;
                }
                stats.details.push(RepairDetail {
                    symbol: gap.symbol().to_string(),
                    frequency: gap.frequency(),
                    range: gap.range(),
                    repaired,
                });
            }
        }

        info!(
            attempted = stats.attempted,
            repaired = stats.repaired,
            failed = stats.failed,
            too_large = stats.skipped_too_large,
            "gap repair finished"
        );

        stats
    }

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
                let known: std::collections::HashSet<String> = active.into_iter().collect();
                if let Some(unknown) = symbols.iter().find(|s| !known.contains(s.as_str())) {
                    return Err(ConfigError::UnknownSymbol(unknown.clone()).into());
                }
                Ok(symbols)
            }
            None => Ok(active),
        }
    }
}

#[async_trait]
impl SyncManager for SyncManagerImpl {
    async fn run_full_sync(
        &self,
        target_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let target_date = target_date.min(Utc::now().date_naive());

        info!(%run_id, %target_date, "starting full sync");

        // Phase 1a: trading calendar refresh.
        let calendar_update = match self.update_trading_calendar(target_date).await {
            Ok(update) => PhaseOutcome::completed(update),
            Err(e) => {
                error!(error = %e, "calendar update phase failed");
                PhaseOutcome::failed(e.to_string())
            }
        };

        // Phase 1b: instrument universe refresh.
        let universe_update = match self.universe.refresh().await {
            Ok(update) => PhaseOutcome::completed(update),
            Err(e) => {
                error!(error = %e, "universe refresh phase failed");
                PhaseOutcome::failed(e.to_string())
            }
        };

        // Wholesale inability to list instruments is the one
        // unrecoverable case; every later phase needs the fleet.
        let symbols = self.resolve_symbols(symbols).await?;

        // Phase 2: incremental market-data sync.
        let incremental_sync = match self
            .engine
            .sync_all_symbols(target_date, Some(symbols.clone()), frequencies.clone(), None)
            .await
        {
            Ok(stats) => PhaseOutcome::completed(stats),
            Err(e) => {
                error!(error = %e, "incremental sync phase failed");
                PhaseOutcome::failed(e.to_string())
            }
        };

        // Phase 3: extended datasets. Failures are isolated per
        // instrument inside, so the phase itself always completes.
        let extended_data =
            PhaseOutcome::completed(self.sync_extended_data(&symbols, target_date).await);

        // Phase 4: gap detection over the trailing window + auto-repair.
        let gap_start = target_date
            .checked_sub_days(Days::new(self.config.gap_scan_days as u64))
            .unwrap_or(self.config.default_start_date);

        let (gap_detection, gap_repair) = match self
            .gap_service
            .detect_all(
                gap_start,
                target_date,
                Some(symbols.clone()),
                frequencies.clone(),
            )
            .await
        {
            Ok(report) => {
                let repair = if self.config.auto_repair && report.summary.total_gaps > 0 {
                    PhaseOutcome::completed(self.repair_gaps(&report).await)
                } else {
                    PhaseOutcome::skipped()
                };
                (PhaseOutcome::completed(report), repair)
            }
            Err(e) => {
                error!(error = %e, "gap detection phase failed");
                (PhaseOutcome::failed(e.to_string()), PhaseOutcome::skipped())
            }
        };

        // Phase 5: validation over the trailing window.
        let validation = if self.config.enable_validation {
            let validation_start = target_date
                .checked_sub_days(Days::new(self.config.validation_days as u64))
                .unwrap_or(self.config.default_start_date);

            match self
                .validator
                .validate_all(
                    validation_start,
                    target_date,
                    Some(symbols.clone()),
                    frequencies,
                )
                .await
            {
                Ok(report) => PhaseOutcome::completed(report),
                Err(e) => {
                    error!(error = %e, "validation phase failed");
                    PhaseOutcome::failed(e.to_string())
                }
            }
        } else {
            PhaseOutcome::skipped()
        };

        let phases = Phases {
            calendar_update,
            universe_update,
            incremental_sync,
            extended_data,
            gap_detection,
            gap_repair,
            validation,
        };
        let summary = phases.summary();

        info!(
            %run_id,
            successful = summary.successful_phases,
            failed = summary.failed_phases,
            "full sync finished"
        );

        Ok(SyncReport {
            run_id,
            target_date,
            phases,
            summary,
            duration_seconds: started.elapsed().as_secs_f64(),
        })
    }

    async fn detect_and_repair_gaps(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<(GapReport, Option<RepairStats>), SyncError> {
        let report = self
            .gap_service
            .detect_all(start_date, end_date, symbols, frequencies)
            .await?;

        let repair = if self.config.auto_repair && report.summary.total_gaps > 0 {
            Some(self.repair_gaps(&report).await)
        } else {
            None
        };

        Ok((report, repair))
    }

    async fn run_validation(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<ValidationReport, SyncError> {
        Ok(self
            .validator
            .validate_all(start_date, end_date, symbols, frequencies)
            .await?)
    }
}
