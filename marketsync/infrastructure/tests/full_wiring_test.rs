use std::sync::Arc;

use chrono::NaiveDate;
use marketsync_application::{
    GapDetectionServiceImpl, GapDetectionServiceImplParameters, IncrementalSyncEngineImpl,
    IncrementalSyncEngineImplParameters, PhaseStatus, SyncConfig, SyncManager, SyncManagerImpl,
    SyncManagerImplParameters, ValidationServiceImpl, ValidationServiceImplParameters,
};
use marketsync_infrastructure::{
    InMemoryCalendarRepository, InMemoryRecordStore, InMemorySyncStatusRepository,
    MockBarProcessor, MockExtendedDataGateway, StaticUniverse, StaticUniverseParameters,
    WeekdayCalendar, WeekdayCalendarFeed,
};
use shaku::{module, HasComponent};

module! {
    TestModule {
        components = [
            InMemoryRecordStore,
            InMemoryCalendarRepository,
            InMemorySyncStatusRepository,
            WeekdayCalendar,
            WeekdayCalendarFeed,
            MockBarProcessor,
            MockExtendedDataGateway,
            StaticUniverse,
            IncrementalSyncEngineImpl,
            GapDetectionServiceImpl,
            ValidationServiceImpl,
            SyncManagerImpl,
        ],
        providers = []
    }
}

fn build_module(symbols: Vec<String>) -> TestModule {
    let config = SyncConfig::default();
    TestModule::builder()
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

#[tokio::test]
async fn wired_module_runs_a_clean_full_sync() {
    let module = build_module(vec!["600000.SS".to_string(), "000001.SZ".to_string()]);
    let manager: Arc<dyn SyncManager> = module.resolve();
    let target = NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(); // Friday

    let report = manager.run_full_sync(target, None, None).await.unwrap();

    assert_eq!(report.summary.failed_phases, 0);
    assert_eq!(report.summary.successful_phases, 6);
    assert_eq!(report.phases.gap_repair.status, PhaseStatus::Skipped);

    // Empty calendar store: the whole buffered year range was fetched.
    let update = report.phases.calendar_update.payload.as_ref().unwrap();
    assert_eq!(update.fetched_ranges.len(), 1);
    assert!(update.updated_records > 0);

    let sync = report.phases.incremental_sync.payload.as_ref().unwrap();
    assert_eq!(sync.success_count, 2);
    assert_eq!(sync.error_count, 0);

    // Mock bars fill the scanned window completely.
    let gaps = report.phases.gap_detection.payload.as_ref().unwrap();
    assert_eq!(gaps.summary.total_gaps, 0);

    let validation = report.phases.validation.payload.as_ref().unwrap();
    assert_eq!(validation.validation_rate, 1.0);
    assert!(validation.total_records > 0);
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let module = build_module(vec!["600000.SS".to_string()]);
    let manager: Arc<dyn SyncManager> = module.resolve();
    let target = NaiveDate::from_ymd_opt(2025, 6, 13).unwrap();

    manager.run_full_sync(target, None, None).await.unwrap();
    let second = manager.run_full_sync(target, None, None).await.unwrap();

    assert_eq!(second.summary.failed_phases, 0);
    let sync = second.phases.incremental_sync.payload.as_ref().unwrap();
    assert_eq!(sync.success_count, 0);
    assert_eq!(sync.skipped_count, 1);
    // The calendar was already extended by the first run.
    let update = second.phases.calendar_update.payload.as_ref().unwrap();
    assert!(update.fetched_ranges.is_empty());
}
