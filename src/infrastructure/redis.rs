use crate::domain::lock::LockHandle;
use crate::domain::ports::LockCoordinator;
use crate::error::{Result, WorkflowError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Script};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

// The key is a hash of owner token -> hold count, so the same owner may
// re-enter and a stranger can never delete someone else's lock.
const ACQUIRE_SCRIPT: &str = r#"
if (redis.call('exists', KEYS[1]) == 0) or (redis.call('hexists', KEYS[1], ARGV[1]) == 1) then
    redis.call('hincrby', KEYS[1], ARGV[1], 1)
    redis.call('pexpire', KEYS[1], ARGV[2])
    return 1
end
return 0
"#;

const RELEASE_SCRIPT: &str = r#"
if redis.call('hexists', KEYS[1], ARGV[1]) == 0 then
    return 0
end
if redis.call('hincrby', KEYS[1], ARGV[1], -1) > 0 then
    return 1
end
redis.call('del', KEYS[1])
return 1
"#;

fn unavailable(e: RedisError) -> WorkflowError {
    WorkflowError::LockServiceUnavailable(e.to_string())
}

/// Lock coordinator backed by a Redis server.
#[derive(Clone)]
pub struct RedisLockCoordinator {
    connection: ConnectionManager,
    retry_delay: Duration,
    acquire: Script,
    release: Script,
}

impl RedisLockCoordinator {
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

    /// Connects to `redis_url`; acquisition polls every `retry_delay`.
    pub async fn connect(redis_url: &str, retry_delay: Duration) -> Result<Self> {
        let client = Client::open(redis_url).map_err(unavailable)?;
        let connection = ConnectionManager::new(client).await.map_err(unavailable)?;
        Ok(Self {
            connection,
            retry_delay,
            acquire: Script::new(ACQUIRE_SCRIPT),
            release: Script::new(RELEASE_SCRIPT),
        })
    }

    async fn attempt(&self, handle: &LockHandle) -> Result<bool> {
        let mut conn = self.connection.clone();
        let lease_ms = handle.lease_budget().as_millis().max(1) as u64;
        let acquired: i32 = self
            .acquire
            .key(handle.key())
            .arg(handle.owner().to_string())
            .arg(lease_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(acquired == 1)
    }
}

#[async_trait]
impl LockCoordinator for RedisLockCoordinator {
    async fn try_acquire(&self, handle: &LockHandle) -> Result<bool> {
        let deadline = Instant::now() + handle.wait_budget();
        loop {
            if self.attempt(handle).await? {
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            debug!(lock.key = handle.key(), "lock busy, retrying");
            tokio::time::sleep(self.retry_delay.min(deadline - now)).await;
        }
    }

    async fn release(&self, handle: &LockHandle) -> Result<()> {
        let mut conn = self.connection.clone();
        let released: i32 = self
            .release
            .key(handle.key())
            .arg(handle.owner().to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        if released == 0 {
            warn!(
                lock.key = handle.key(),
                "lock was not held by this owner (expired or never acquired)"
            );
        }
        Ok(())
    }
}
