pub mod memory;
pub mod redis;

pub use memory::InMemorySyncStatusRepository;
pub use redis::RedisSyncStatusRepository;
