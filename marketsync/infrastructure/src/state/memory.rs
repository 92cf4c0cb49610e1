use std::collections::HashMap;

use async_trait::async_trait;
use marketsync_application::{StatusError, SyncStatusRepository};
use marketsync_domain::{Frequency, SyncStatus};
use shaku::Component;
use tokio::sync::RwLock;

/// Status rows in process memory; suitable for tests and single-run
/// invocations where history does not need to survive.
#[derive(Component, Default)]
#[shaku(interface = SyncStatusRepository)]
pub struct InMemorySyncStatusRepository {
    #[shaku(default)]
    states: RwLock<HashMap<(String, Frequency), SyncStatus>>,
}

impl InMemorySyncStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncStatusRepository for InMemorySyncStatusRepository {
    async fn get(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<SyncStatus>, StatusError> {
        Ok(self
            .states
            .read()
            .await
            .get(&(symbol.to_string(), frequency))
            .cloned())
    }

    async fn upsert(&self, status: &SyncStatus) -> Result<(), StatusError> {
        self.states
            .write()
            .await
            .insert((status.symbol.clone(), status.frequency), status.clone());
        Ok(())
    }
}
