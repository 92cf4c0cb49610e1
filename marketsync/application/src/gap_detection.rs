use async_trait::async_trait;
use chrono::NaiveDate;
use marketsync_domain::{merge_missing, DateRange, Frequency, Gap};
use shaku::{Component, Interface};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SyncConfig};
use crate::ports::{CalendarError, CalendarOracle, InstrumentUniverse, RecordStore, StoreError};
use crate::report::{FrequencyGaps, GapReport, GapSummary, SymbolError};

/// Diffs calendar trading dates against stored dates. Read/compute only;
/// never mutates the store.
#[async_trait]
pub trait GapDetectionService: Interface {
    async fn detect(
        &self,
        symbol: &str,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Gap>, GapError>;

    async fn detect_all(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<GapReport, GapError>;
}

#[derive(Component)]
#[shaku(interface = GapDetectionService)]
pub struct GapDetectionServiceImpl {
    #[shaku(inject)]
    calendar: Arc<dyn CalendarOracle>,

    #[shaku(inject)]
    store: Arc<dyn RecordStore>,

    #[shaku(inject)]
    universe: Arc<dyn InstrumentUniverse>,

    config: SyncConfig,
}

impl GapDetectionServiceImpl {
    pub fn new(
        calendar: Arc<dyn CalendarOracle>,
        store: Arc<dyn RecordStore>,
        universe: Arc<dyn InstrumentUniverse>,
        config: SyncConfig,
    ) -> Self {
        Self {
            calendar,
            store,
            universe,
            config,
        }
    }

    fn check_request(
        &self,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<DateRange, ConfigError> {
        if !self.config.frequencies.contains(&frequency) {
            return Err(ConfigError::UnsupportedFrequency(frequency));
        }
        DateRange::new(start_date, end_date).map_err(|_| ConfigError::InvalidRange {
            start: start_date,
            end: end_date,
        })
    }

    async fn resolve_symbols(
        &self,
        symbols: Option<Vec<String>>,
    ) -> Result<Vec<String>, GapError> {
        let active = self
            .universe
            .active_symbols()
            .await
            .map_err(|e| GapError::Universe(e.to_string()))?;

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

    async fn detect_frequency(
        &self,
        symbols: &[String],
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FrequencyGaps, GapError> {
        let mut result = FrequencyGaps {
            frequency,
            gaps: Vec::new(),
            symbols_with_gaps: Default::default(),
            unknown_symbols: Vec::new(),
        };

        for symbol in symbols {
            match self.detect(symbol, frequency, start_date, end_date).await {
                Ok(gaps) => {
                    if !gaps.is_empty() {
                        result.symbols_with_gaps.insert(symbol.clone());
                        result.gaps.extend(gaps);
                    }
                }
                // Missing calendar or a store read failure means this
                // instrument's gap state is unknown, not "no gaps".
                Err(e @ (GapError::Calendar(_) | GapError::Store(_))) => {
                    warn!(symbol, frequency = %frequency, error = %e, "gap state unknown");
                    result.unknown_symbols.push(SymbolError {
                        symbol: symbol.clone(),
                        frequency,
                        message: e.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl GapDetectionService for GapDetectionServiceImpl {
    async fn detect(
        &self,
        symbol: &str,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Gap>, GapError> {
        let range = self.check_request(frequency, start_date, end_date)?;

        // An oracle with no data for the market errors out; an empty
        // result here means the range legitimately has no trading days.
        let trading_days = self
            .calendar
            .trading_days(&self.config.market, range)
            .await?;

        let stored = self.store.stored_dates(symbol, frequency, range).await?;
        let stored: std::collections::HashSet<NaiveDate> = stored.into_iter().collect();

        let gaps = merge_missing(symbol, frequency, &trading_days, &stored);
        debug!(symbol, %range, gaps = gaps.len(), "gap detection finished");
        Ok(gaps)
    }

    async fn detect_all(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<GapReport, GapError> {
        let frequencies = frequencies.unwrap_or_else(|| self.config.frequencies.clone());
        for frequency in &frequencies {
            self.check_request(*frequency, start_date, end_date)?;
        }
        let range = DateRange::new(start_date, end_date).map_err(|_| {
            GapError::Config(ConfigError::InvalidRange {
                start: start_date,
                end: end_date,
            })
        })?;

        let symbols = self.resolve_symbols(symbols).await?;

        info!(
            %range,
            symbols = symbols.len(),
            frequencies = frequencies.len(),
            "starting fleet gap detection"
        );

        let mut by_frequency = Vec::with_capacity(frequencies.len());
        let mut summary = GapSummary::default();

        for frequency in frequencies {
            let freq_gaps = self
                .detect_frequency(&symbols, frequency, start_date, end_date)
                .await?;

            summary.total_gaps += freq_gaps.gaps.len();
            summary.symbols_with_gaps += freq_gaps.symbols_with_gaps.len();
            summary.unknown_symbols += freq_gaps.unknown_symbols.len();
            for gap in &freq_gaps.gaps {
                *summary.severity_counts.entry(gap.severity()).or_insert(0) += 1;
            }

            by_frequency.push(freq_gaps);
        }

        info!(
            total_gaps = summary.total_gaps,
            symbols_with_gaps = summary.symbols_with_gaps,
            unknown = summary.unknown_symbols,
            "fleet gap detection finished"
        );

        Ok(GapReport {
            range,
            total_symbols: symbols.len(),
            by_frequency,
            summary,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("instrument universe unavailable: {0}")]
    Universe(String),
}
