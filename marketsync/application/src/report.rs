use crate::ports::{ExtendedOutcome, UniverseUpdate};
use chrono::NaiveDate;
use marketsync_domain::{DateRange, Frequency, Gap, GapSeverity, ValidationIssue, YearRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Completed,
    Failed,
    Skipped,
}

/// Outcome of one orchestrator phase. A failed phase keeps its error
/// here instead of aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome<T> {
    pub status: PhaseStatus,
    pub payload: Option<T>,
    pub error: Option<String>,
}

impl<T> PhaseOutcome<T> {
    pub fn completed(payload: T) -> Self {
        Self {
            status: PhaseStatus::Completed,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Failed,
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: PhaseStatus::Skipped,
            payload: None,
            error: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PhaseStatus::Completed
    }
}

/// Per-instrument range sync result (one `process()` call).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSyncResult {
    pub symbol: String,
    pub frequency: Frequency,
    pub range: DateRange,
    pub success_count: usize,
    pub error_count: usize,
    pub synced_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub synced_days: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolError {
    pub symbol: String,
    pub frequency: Frequency,
    pub message: String,
}

/// Fleet-wide incremental sync aggregate. "Nothing needed work" shows up
/// as skipped_count == total_symbols, never as a bare success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    pub total_symbols: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub synced_ranges: BTreeMap<String, SyncedRange>,
    pub errors: Vec<SymbolError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyGaps {
    pub frequency: Frequency,
    pub gaps: Vec<Gap>,
    pub symbols_with_gaps: BTreeSet<String>,
    /// Symbols whose gap state could not be determined (calendar or
    /// store failure). Unknown, not "no gaps".
    pub unknown_symbols: Vec<SymbolError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapSummary {
    pub total_gaps: usize,
    pub symbols_with_gaps: usize,
    pub unknown_symbols: usize,
    pub severity_counts: BTreeMap<GapSeverity, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub range: DateRange,
    pub total_symbols: usize,
    pub by_frequency: Vec<FrequencyGaps>,
    pub summary: GapSummary,
}

/// Result of scanning one (symbol, frequency) for implausible records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeValidation {
    pub symbol: String,
    pub frequency: Frequency,
    pub total_records: usize,
    pub invalid_records: usize,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub range: DateRange,
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    /// valid / total; 1.0 when nothing was scanned.
    pub validation_rate: f64,
    pub issues: Vec<RangeValidation>,
    pub failed_symbols: Vec<SymbolError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairDetail {
    pub symbol: String,
    pub frequency: Frequency,
    pub range: DateRange,
    pub repaired: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairStats {
    pub total_gaps: usize,
    pub attempted: usize,
    pub repaired: usize,
    pub failed: usize,
    /// Gaps above the configured repair cap; reported, never silently
    /// auto-repaired.
    pub skipped_too_large: usize,
    pub details: Vec<RepairDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarUpdate {
    pub market: String,
    pub fetched_ranges: Vec<YearRange>,
    pub updated_records: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedStats {
    pub processed_symbols: usize,
    pub failed_symbols: usize,
    pub totals: ExtendedOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phases {
    pub calendar_update: PhaseOutcome<CalendarUpdate>,
    pub universe_update: PhaseOutcome<UniverseUpdate>,
    pub incremental_sync: PhaseOutcome<SyncStats>,
    pub extended_data: PhaseOutcome<ExtendedStats>,
    pub gap_detection: PhaseOutcome<GapReport>,
    pub gap_repair: PhaseOutcome<RepairStats>,
    pub validation: PhaseOutcome<ValidationReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_phases: usize,
    pub successful_phases: usize,
    pub failed_phases: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub target_date: NaiveDate,
    pub phases: Phases,
    pub summary: RunSummary,
    pub duration_seconds: f64,
}

impl Phases {
    pub fn summary(&self) -> RunSummary {
        let statuses = [
            self.calendar_update.status,
            self.universe_update.status,
            self.incremental_sync.status,
            self.extended_data.status,
            self.gap_detection.status,
            self.gap_repair.status,
            self.validation.status,
        ];

        RunSummary {
            total_phases: statuses.len(),
            successful_phases: statuses
                .iter()
                .filter(|s| **s == PhaseStatus::Completed)
                .count(),
            failed_phases: statuses
                .iter()
                .filter(|s| **s == PhaseStatus::Failed)
                .count(),
        }
    }
}
