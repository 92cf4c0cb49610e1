use async_trait::async_trait;
use chrono::NaiveDate;
use marketsync_domain::{check_bar, DateRange, Frequency};
use shaku::{Component, Interface};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SyncConfig};
use crate::ports::{InstrumentUniverse, RecordStore, StoreError};
use crate::report::{RangeValidation, SymbolError, ValidationReport};

/// Scans stored records for implausible rows. Reporting only;
/// remediation is a separate re-fetch decision.
#[async_trait]
pub trait ValidationService: Interface {
    async fn validate(
        &self,
        symbol: &str,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RangeValidation, ValidationError>;

    async fn validate_all(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<ValidationReport, ValidationError>;
}

#[derive(Component)]
#[shaku(interface = ValidationService)]
pub struct ValidationServiceImpl {
    #[shaku(inject)]
    store: Arc<dyn RecordStore>,

    #[shaku(inject)]
    universe: Arc<dyn InstrumentUniverse>,

    config: SyncConfig,
}

impl ValidationServiceImpl {
    pub fn new(
        store: Arc<dyn RecordStore>,
        universe: Arc<dyn InstrumentUniverse>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            universe,
            config,
        }
    }

    fn check_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<DateRange, ValidationError> {
        DateRange::new(start_date, end_date).map_err(|_| {
            ValidationError::Config(ConfigError::InvalidRange {
                start: start_date,
                end: end_date,
            })
        })
    }

    async fn resolve_symbols(
        &self,
        symbols: Option<Vec<String>>,
    ) -> Result<Vec<String>, ValidationError> {
        let active = self
            .universe
            .active_symbols()
            .await
            .map_err(|e| ValidationError::Universe(e.to_string()))?;

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
impl ValidationService for ValidationServiceImpl {
    async fn validate(
        &self,
        symbol: &str,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RangeValidation, ValidationError> {
        let range = self.check_range(start_date, end_date)?;
        let bars = self.store.read_range(symbol, frequency, range).await?;

        let mut invalid_records = 0;
        let mut issues = Vec::new();
        let total_records = bars.len();

        for bar in &bars {
            let bar_issues = check_bar(bar);
            if !bar_issues.is_empty() {
                invalid_records += 1;
                issues.extend(bar_issues);
            }
        }

        debug!(
            symbol,
            frequency = %frequency,
            total_records,
            invalid_records,
            "range validation finished"
        );

        Ok(RangeValidation {
            symbol: symbol.to_string(),
            frequency,
            total_records,
            invalid_records,
            issues,
        })
    }

    async fn validate_all(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        symbols: Option<Vec<String>>,
        frequencies: Option<Vec<Frequency>>,
    ) -> Result<ValidationReport, ValidationError> {
        let range = self.check_range(start_date, end_date)?;
        let frequencies = frequencies.unwrap_or_else(|| self.config.frequencies.clone());
        let symbols = self.resolve_symbols(symbols).await?;

        info!(%range, symbols = symbols.len(), "starting fleet validation");

        let mut report = ValidationReport {
            range,
            total_records: 0,
            valid_records: 0,
            invalid_records: 0,
            validation_rate: 1.0,
            issues: Vec::new(),
            failed_symbols: Vec::new(),
        };

        for frequency in &frequencies {
            for symbol in &symbols {
                match self.validate(symbol, *frequency, start_date, end_date).await {
                    Ok(result) => {
                        report.total_records += result.total_records;
                        report.invalid_records += result.invalid_records;
                        if result.invalid_records > 0 {
                            report.issues.push(result);
                        }
                    }
                    Err(e @ ValidationError::Store(_)) => {
                        warn!(symbol, error = %e, "validation skipped for instrument");
                        report.failed_symbols.push(SymbolError {
                            symbol: symbol.clone(),
                            frequency: *frequency,
                            message: e.to_string(),
                        });
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        report.valid_records = report.total_records - report.invalid_records;
        if report.total_records > 0 {
            report.validation_rate = report.valid_records as f64 / report.total_records as f64;
        }

        info!(
            total_records = report.total_records,
            invalid_records = report.invalid_records,
            rate = report.validation_rate,
            "fleet validation finished"
        );

        Ok(report)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("instrument universe unavailable: {0}")]
    Universe(String),
}
