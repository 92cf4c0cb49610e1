pub mod calendar;
pub mod gateways;
pub mod redis;
pub mod state;
pub mod stores;
pub mod universe;

pub use calendar::{InMemoryCalendarRepository, WeekdayCalendar, WeekdayCalendarFeed};
pub use gateways::{MockBarProcessor, MockBarProcessorParameters, MockExtendedDataGateway};
pub use crate::redis::RedisConnection;
pub use state::{InMemorySyncStatusRepository, RedisSyncStatusRepository};
pub use stores::InMemoryRecordStore;
pub use universe::{StaticUniverse, StaticUniverseParameters};
