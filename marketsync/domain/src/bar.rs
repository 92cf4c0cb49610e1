use crate::Frequency;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One stored market record, uniquely keyed by (symbol, date, frequency).
/// Upserts overwrite in place; the store never holds duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub turnover: Decimal,
}

/// A single plausibility violation found in a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub date: NaiveDate,
    pub field: String,
    pub reason: String,
}

impl ValidationIssue {
    fn new(date: NaiveDate, field: &str, reason: impl Into<String>) -> Self {
        Self {
            date,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Flags implausible fields in a stored bar. Reporting only; remediation
/// is a separate re-fetch decision.
pub fn check_bar(bar: &Bar) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (field, value) in [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ] {
        if value <= Decimal::ZERO {
            issues.push(ValidationIssue::new(
                bar.date,
                field,
                format!("price must be positive, got {value}"),
            ));
        }
    }

    if bar.high < bar.low {
        issues.push(ValidationIssue::new(
            bar.date,
            "high",
            format!("high {} below low {}", bar.high, bar.low),
        ));
    }

    if bar.open < bar.low || bar.open > bar.high {
        issues.push(ValidationIssue::new(
            bar.date,
            "open",
            format!(
                "open {} outside [{}, {}]",
                bar.open, bar.low, bar.high
            ),
        ));
    }

    if bar.close < bar.low || bar.close > bar.high {
        issues.push(ValidationIssue::new(
            bar.date,
            "close",
            format!(
                "close {} outside [{}, {}]",
                bar.close, bar.low, bar.high
            ),
        ));
    }

    if bar.volume < 0 {
        issues.push(ValidationIssue::new(
            bar.date,
            "volume",
            format!("volume must be non-negative, got {}", bar.volume),
        ));
    }

    issues
}
