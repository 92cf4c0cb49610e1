pub mod config;
pub mod gap_detection;
pub mod ports;
pub mod report;
pub mod sync_engine;
pub mod sync_manager;
pub mod validation;

pub use config::{ConfigError, SyncConfig, SyncMode};
pub use gap_detection::{
    GapDetectionService, GapDetectionServiceImpl, GapDetectionServiceImplParameters, GapError,
};
pub use ports::{
    BarProcessor, CalendarError, CalendarFeed, CalendarOracle, CalendarRepository,
    ExtendedDataGateway, ExtendedOutcome, InstrumentUniverse, ProcessError, ProcessOutcome,
    RecordStore, StatusError, StoreError, SyncStatusRepository, UniverseError, UniverseUpdate,
};
pub use report::{
    CalendarUpdate, ExtendedStats, FrequencyGaps, GapReport, GapSummary, PhaseOutcome,
    PhaseStatus, Phases, RangeSyncResult, RangeValidation, RepairDetail, RepairStats, RunSummary,
    SymbolError, SyncReport, SyncStats, SyncedRange, ValidationReport,
};
pub use sync_engine::{
    IncrementalSyncEngine, IncrementalSyncEngineImpl, IncrementalSyncEngineImplParameters,
    ProgressFn, ProgressKind, SyncError, SyncProgress, SyncRange,
};
pub use sync_manager::{SyncManager, SyncManagerImpl, SyncManagerImplParameters};
pub use validation::{
    ValidationError, ValidationService, ValidationServiceImpl, ValidationServiceImplParameters,
};
