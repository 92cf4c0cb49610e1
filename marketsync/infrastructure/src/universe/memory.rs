use async_trait::async_trait;
use marketsync_application::{InstrumentUniverse, UniverseError, UniverseUpdate};
use shaku::Component;
use tracing::info;

/// Fixed instrument list supplied at wiring time. `refresh` is a no-op
/// beyond reporting the current size; a live universe would diff against
/// an upstream listing service here.
#[derive(Component, Default)]
#[shaku(interface = InstrumentUniverse)]
pub struct StaticUniverse {
    #[shaku(default)]
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }
}

#[async_trait]
impl InstrumentUniverse for StaticUniverse {
    async fn active_symbols(&self) -> Result<Vec<String>, UniverseError> {
        Ok(self.symbols.clone())
    }

    async fn refresh(&self) -> Result<UniverseUpdate, UniverseError> {
        info!(total = self.symbols.len(), "static universe refreshed");
        Ok(UniverseUpdate {
            total_symbols: self.symbols.len(),
            added: 0,
            removed: 0,
        })
    }
}
