use crate::{DateRange, Frequency};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A maximal contiguous run of trading dates with no stored record.
/// Ephemeral: recomputed per detection call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    symbol: String,
    frequency: Frequency,
    range: DateRange,
    trading_days: u32,
    kind: GapKind,
    severity: GapSeverity,
}

impl Gap {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Number of missing trading dates covered, which drives severity.
    /// Weekends and holidays inside the range do not count.
    pub fn trading_days(&self) -> u32 {
        self.trading_days
    }

    pub fn kind(&self) -> GapKind {
        self.kind
    }

    pub fn severity(&self) -> GapSeverity {
        self.severity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    DateMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GapSeverity {
    pub fn from_trading_days(trading_days: u32) -> Self {
        match trading_days {
            0 | 1 => GapSeverity::Low,
            2..=3 => GapSeverity::Medium,
            4..=7 => GapSeverity::High,
            _ => GapSeverity::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GapSeverity::Low => "low",
            GapSeverity::Medium => "medium",
            GapSeverity::High => "high",
            GapSeverity::Critical => "critical",
        }
    }
}

/// Merges missing trading dates into maximal gaps.
///
/// `trading_days` must be the ordered trading calendar for the scanned
/// range. Adjacency is positional in that sequence: two missing dates
/// separated only by non-trading days form one gap, while a stored
/// trading date always closes the current run.
pub fn merge_missing(
    symbol: &str,
    frequency: Frequency,
    trading_days: &[NaiveDate],
    stored: &HashSet<NaiveDate>,
) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let mut run: Option<(NaiveDate, NaiveDate, u32)> = None;

    for &day in trading_days {
        if stored.contains(&day) {
            if let Some((start, end, count)) = run.take() {
                gaps.push(build_gap(symbol, frequency, start, end, count));
            }
        } else {
            run = match run {
                None => Some((day, day, 1)),
                Some((start, _, count)) => Some((start, day, count + 1)),
            };
        }
    }

    if let Some((start, end, count)) = run {
        gaps.push(build_gap(symbol, frequency, start, end, count));
    }

    gaps
}

fn build_gap(
    symbol: &str,
    frequency: Frequency,
    start: NaiveDate,
    end: NaiveDate,
    trading_days: u32,
) -> Gap {
    Gap {
        symbol: symbol.to_string(),
        frequency,
        // Endpoints are trading dates, so start <= end always holds.
        range: DateRange::new(start, end).expect("missing run must be ordered"),
        trading_days,
        kind: GapKind::DateMissing,
        severity: GapSeverity::from_trading_days(trading_days),
    }
}
