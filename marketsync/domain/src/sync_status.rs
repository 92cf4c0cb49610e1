use crate::Frequency;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Persisted bookkeeping record, one row per (symbol, frequency).
/// Created on the first sync attempt, updated after every run,
/// never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub symbol: String,
    pub frequency: Frequency,
    pub last_sync_date: NaiveDate,
    pub last_data_date: Option<NaiveDate>,
    pub state: SyncState,
    pub error_message: Option<String>,
    pub total_records: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Completed,
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Completed => "completed",
            SyncState::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(SyncState::Completed),
            "failed" => Some(SyncState::Failed),
            _ => None,
        }
    }
}
