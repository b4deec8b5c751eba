//! # Redis
//!
//! Durable key-value store behind the view counter.
//!
//! Everything the service knows lives here, the process itself keeps no counts. That keeps the
//! server stateless and lets as many replicas as needed share one Redis.
//!
//! ## Keys
//!
//! - `deduplicate:{sha256(ip)}:{slug}`: presence flag, `SET NX EX`, expires after the dedup window
//! - `pageviews:{unit}:{slug}`: integer count, `INCR`, never deleted
//!
//! ## Atomicity
//!
//! Both primitives are single Redis commands, so there is no check-then-set race:
//! - `SET NX EX` creates the marker and its expiry in one step, exactly one concurrent caller wins
//! - `INCR` treats a missing key as 0, concurrent increments are never lost
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, RedisResult,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

const MARKER_VALUE: &str = "true";

/// The two atomic primitives the counter needs from its store.
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Sets `key` with an expiry only if it does not exist. Returns `true` when it was created.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> RedisResult<bool>;

    /// Atomically adds 1 to `key` and returns the new value.
    async fn increment(&self, key: &str) -> RedisResult<i64>;
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

pub async fn init_redis(redis_url: &str) -> RedisResult<RedisStore> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection = client.get_connection_manager_with_config(config).await?;

    Ok(RedisStore { connection })
}

#[async_trait]
impl ViewStore for RedisStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> RedisResult<bool> {
        let mut connection = self.connection.clone();

        // nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(MARKER_VALUE)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut connection)
            .await?;

        Ok(reply.is_some())
    }

    async fn increment(&self, key: &str) -> RedisResult<i64> {
        let mut connection = self.connection.clone();

        connection.incr(key, 1).await
    }
}

#[cfg(test)]
mod tests {
    use redis::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let err = init_redis("not a redis url").await.err().unwrap();

        assert_eq!(err.kind(), ErrorKind::InvalidClientConfig);
    }
}
