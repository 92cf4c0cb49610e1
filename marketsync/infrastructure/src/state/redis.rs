use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use marketsync_application::{StatusError, SyncStatusRepository};
use marketsync_domain::{Frequency, SyncState, SyncStatus};
use redis::aio::MultiplexedConnection;
use shaku::Component;

use crate::redis::RedisConnection;

const FIELD_LAST_SYNC_DATE: &str = "last_sync_date";
const FIELD_LAST_DATA_DATE: &str = "last_data_date";
const FIELD_STATE: &str = "state";
const FIELD_ERROR_MESSAGE: &str = "error_message";
const FIELD_TOTAL_RECORDS: &str = "total_records";
const FIELD_UPDATED_AT: &str = "updated_at";

fn status_key(symbol: &str, frequency: Frequency) -> String {
    format!("marketsync:status:{}:{}", symbol, frequency)
}

/// Status rows as one Redis hash per (symbol, frequency) key.
#[derive(Component)]
#[shaku(interface = SyncStatusRepository)]
pub struct RedisSyncStatusRepository {
    #[shaku(inject)]
    redis: Arc<dyn RedisConnection>,
}

impl RedisSyncStatusRepository {
    async fn connection(&self) -> Result<MultiplexedConnection, StatusError> {
        self.redis
            .get_connection()
            .await
            .map_err(|e| StatusError::Backend(e.to_string()))
    }
}

#[async_trait]
impl SyncStatusRepository for RedisSyncStatusRepository {
    async fn get(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<SyncStatus>, StatusError> {
        let mut conn = self.connection().await?;
        let key = status_key(symbol, frequency);

        let (last_sync_date, last_data_date, state, error_message, total_records, updated_at): (
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<u64>,
            Option<String>,
        ) = redis::cmd("HMGET")
            .arg(&key)
            .arg(FIELD_LAST_SYNC_DATE)
            .arg(FIELD_LAST_DATA_DATE)
            .arg(FIELD_STATE)
            .arg(FIELD_ERROR_MESSAGE)
            .arg(FIELD_TOTAL_RECORDS)
            .arg(FIELD_UPDATED_AT)
            .query_async(&mut conn)
            .await
            .map_err(|e| StatusError::Backend(e.to_string()))?;

        let (Some(last_sync_date), Some(state), Some(updated_at)) =
            (last_sync_date, state, updated_at)
        else {
            return Ok(None);
        };

        Ok(Some(SyncStatus {
            symbol: symbol.to_string(),
            frequency,
            last_sync_date: parse_date(&last_sync_date)?,
            last_data_date: last_data_date.as_deref().map(parse_date).transpose()?,
            state: SyncState::parse(&state)
                .ok_or_else(|| StatusError::Backend(format!("unknown sync state: {state}")))?,
            error_message,
            total_records: total_records.unwrap_or(0),
            updated_at: parse_timestamp(&updated_at)?,
        }))
    }

    async fn upsert(&self, status: &SyncStatus) -> Result<(), StatusError> {
        let mut conn = self.connection().await?;
        let key = status_key(&status.symbol, status.frequency);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset(&key, FIELD_LAST_SYNC_DATE, status.last_sync_date.to_string());
        pipe.hset(&key, FIELD_STATE, status.state.as_str());
        pipe.hset(&key, FIELD_TOTAL_RECORDS, status.total_records);
        pipe.hset(&key, FIELD_UPDATED_AT, status.updated_at.to_rfc3339());

        match &status.last_data_date {
            Some(date) => pipe.hset(&key, FIELD_LAST_DATA_DATE, date.to_string()),
            None => pipe.hdel(&key, FIELD_LAST_DATA_DATE),
        };
        match &status.error_message {
            Some(message) => pipe.hset(&key, FIELD_ERROR_MESSAGE, message),
            None => pipe.hdel(&key, FIELD_ERROR_MESSAGE),
        };

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| StatusError::Backend(e.to_string()))?;
        Ok(())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, StatusError> {
    raw.parse::<NaiveDate>()
        .map_err(|e| StatusError::Backend(format!("bad stored date {raw}: {e}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StatusError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StatusError::Backend(format!("bad stored timestamp {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_includes_symbol_and_frequency_code() {
        assert_eq!(
            status_key("600000.SS", Frequency::Daily),
            "marketsync:status:600000.SS:1d"
        );
        assert_eq!(
            status_key("600000.SS", Frequency::Min5),
            "marketsync:status:600000.SS:5m"
        );
    }
}
