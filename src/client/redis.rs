//! Key-value client for Redis (and Redis-compatible databases)

use async_trait::async_trait;
use fred::{
    interfaces::EventInterface,
    prelude::{
        Builder, ClientLike, Config, KeysInterface, Pool, ReconnectPolicy, ServerConfig,
        SetsInterface,
    },
    types::Expiration,
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    error::SessionResult,
    events::{EventSender, StoreEvent},
    options::SessionStoreOptions,
};

use super::interface::KeyValueClient;

/**
Redis client using the [fred.rs](https://docs.rs/fred) crate.

Wraps a fred.rs connection pool. You can pass in your own pool, or let
[`SessionStore::connect`](crate::SessionStore::connect) build one from
[`SessionStoreOptions`]. Authentication and database selection are part of the
fred.rs [`Config`], so they're reapplied whenever the pool reconnects.

```rust,no_run
use fred::prelude::{Builder, ClientLike, Config};
use redis_session_store::{client::redis::FredClient, SessionStore};

async fn setup_store() -> SessionStore<FredClient> {
    // Setup and initialize a fred.rs Redis pool.
    let redis_pool = Builder::default_centralized()
        .set_config(Config::from_url("redis://localhost/2").expect("Valid Redis URL"))
        .build_pool(4)
        .expect("Should build Redis pool");
    redis_pool.init().await.expect("Should initialize Redis pool");

    SessionStore::new(FredClient::new(redis_pool), "koa:sess:")
}
```
*/
pub struct FredClient {
    pool: Pool,
}

impl FredClient {
    /// Wrap an existing fred.rs pool. The pool should already be initialized.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// The underlying fred.rs pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Build a pool from the store options. The pool is not connected yet;
    /// call [`FredClient::init`] once the events are wired.
    pub(crate) fn from_options(options: &SessionStoreOptions) -> SessionResult<Self> {
        let server = match &options.socket {
            Some(path) => ServerConfig::Unix { path: path.into() },
            None => ServerConfig::new_centralized(options.host.as_str(), options.port),
        };
        let config = Config {
            server,
            password: options.pass.clone(),
            database: options.db,
            ..Default::default()
        };
        tracing::debug!(
            "Init redis with host: {}, port: {}",
            options.host,
            options.port
        );
        let pool = Builder::from_config(config)
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 30_000, 2))
            .build_pool(options.pool_size)?;
        Ok(Self { pool })
    }

    /// Connect the pool. Connection and authentication failures are returned.
    pub(crate) async fn init(&self) -> SessionResult<()> {
        let _connection_task = self.pool.init().await?;
        Ok(())
    }
}

/// Forward every message of a fred.rs notification stream as `event`.
async fn forward<M>(mut rx: broadcast::Receiver<M>, events: EventSender, event: StoreEvent)
where
    M: Clone + Send + 'static,
{
    loop {
        match rx.recv().await {
            Ok(_) => events.send(event),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

#[async_trait]
impl KeyValueClient for FredClient {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.pool.get(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> SessionResult<()> {
        let _: () = self.pool.set(key, value, None, None, false).await?;
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, seconds: u64, value: String) -> SessionResult<()> {
        let expiration = Expiration::EX(seconds.try_into().unwrap_or(i64::MAX));
        let _: () = self
            .pool
            .set(key, value, Some(expiration), None, false)
            .await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> SessionResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        Ok(self.pool.del(keys.to_vec()).await?)
    }

    async fn set_add(&self, set_key: &str, member: &str) -> SessionResult<()> {
        let _: () = self.pool.sadd(set_key, member).await?;
        Ok(())
    }

    async fn set_remove(&self, set_key: &str, members: &[String]) -> SessionResult<()> {
        if members.is_empty() {
            return Ok(());
        }
        let _: () = self.pool.srem(set_key, members.to_vec()).await?;
        Ok(())
    }

    async fn set_members(&self, set_key: &str) -> SessionResult<Vec<String>> {
        Ok(self.pool.smembers(set_key).await?)
    }

    async fn expire(&self, key: &str, seconds: u64) -> SessionResult<()> {
        let seconds = seconds.try_into().unwrap_or(i64::MAX);
        let _: () = self.pool.expire(key, seconds, None).await?;
        Ok(())
    }

    async fn batch_get(&self, keys: &[String]) -> SessionResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.pool.mget(keys.to_vec()).await?)
    }

    fn forward_events(&self, events: EventSender) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("No Tokio runtime available, Redis connection events won't be reported");
            return;
        }
        for client in self.pool.clients() {
            tokio::spawn(forward(
                client.reconnect_rx(),
                events.clone(),
                StoreEvent::Connect,
            ));
            tokio::spawn(forward(
                client.error_rx(),
                events.clone(),
                StoreEvent::Disconnect,
            ));
        }
    }

    async fn shutdown(&self) -> SessionResult<()> {
        Ok(self.pool.quit().await?)
    }
}
