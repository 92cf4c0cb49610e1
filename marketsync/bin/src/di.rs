use marketsync_application::{
    GapDetectionServiceImpl, GapDetectionServiceImplParameters, IncrementalSyncEngineImpl,
    IncrementalSyncEngineImplParameters, SyncConfig, SyncManagerImpl, SyncManagerImplParameters,
    ValidationServiceImpl, ValidationServiceImplParameters,
};
use marketsync_infrastructure::redis::RedisConnectionManager;
use marketsync_infrastructure::{
    InMemoryCalendarRepository, InMemoryRecordStore, MockBarProcessor, MockExtendedDataGateway,
    RedisSyncStatusRepository, StaticUniverse, StaticUniverseParameters, WeekdayCalendar,
    WeekdayCalendarFeed,
};
use shaku::module;

module! {
    pub AppModule {
        components = [
            InMemoryRecordStore,
            InMemoryCalendarRepository,
            WeekdayCalendar,
            WeekdayCalendarFeed,
            MockBarProcessor,
            MockExtendedDataGateway,
            StaticUniverse,
            RedisConnectionManager,
            RedisSyncStatusRepository,
            IncrementalSyncEngineImpl,
            GapDetectionServiceImpl,
            ValidationServiceImpl,
            SyncManagerImpl
        ],
        providers = []
    }
}

pub fn create_app_module(config: SyncConfig, symbols: Vec<String>) -> AppModule {
    AppModule::builder()
        .with_component_parameters::<StaticUniverse>(StaticUniverseParameters { symbols })
        .with_component_parameters::<IncrementalSyncEngineImpl>(
            IncrementalSyncEngineImplParameters {
                config: config.clone(),
            },
        )
        .with_component_parameters::<GapDetectionServiceImpl>(GapDetectionServiceImplParameters {
            config: config.clone(),
        })
        .with_component_parameters::<ValidationServiceImpl>(ValidationServiceImplParameters {
            config: config.clone(),
        })
        .with_component_parameters::<SyncManagerImpl>(SyncManagerImplParameters { config })
        .build()
}

pub fn default_symbols() -> Vec<String> {
    ["600000.SS", "000001.SZ", "600519.SS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn parse_symbols(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default_symbols(),
    }
}
