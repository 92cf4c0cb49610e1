use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client as RedisClient, RedisResult};
use shaku::{Component, Interface};

#[async_trait]
pub trait RedisConnection: Interface {
    async fn get_connection(&self) -> RedisResult<MultiplexedConnection>;
}

fn default_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1".to_string())
}

/// Hands out multiplexed connections for the sync-status hash. The
/// client is opened per call, so a bad URL surfaces as a repository
/// error instead of failing module construction.
#[derive(Component)]
#[shaku(interface = RedisConnection)]
pub struct RedisConnectionManager {
    #[shaku(default = default_redis_url())]
    url: String,
}

impl RedisConnectionManager {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RedisConnection for RedisConnectionManager {
    async fn get_connection(&self) -> RedisResult<MultiplexedConnection> {
        let client = RedisClient::open(self.url.as_str())?;
        client.get_multiplexed_async_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_surfaces_an_error() {
        let manager = RedisConnectionManager::new("not a redis url");
        assert!(manager.get_connection().await.is_err());
    }
}
