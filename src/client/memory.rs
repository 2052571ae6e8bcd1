//! In-memory key-value client

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use retainer::{entry::CacheExpiration, Cache};
use tokio::{select, spawn, sync::oneshot};

use crate::error::SessionResult;

use super::interface::KeyValueClient;

/// A set value along with an optional deadline.
#[derive(Default)]
struct MemorySet {
    members: HashSet<String>,
    expires_at: Option<Instant>,
}

impl MemorySet {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-memory key-value client. This is designed mostly for local development
/// and tests, and not for production use. String values live in an async
/// cache from the [retainer] crate, which handles expiration.
///
/// ```rust
/// use redis_session_store::{client::memory::MemoryClient, SessionStore};
///
/// let store = SessionStore::new(MemoryClient::default(), "sess:");
/// ```
pub struct MemoryClient {
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    values: Arc<Cache<String, String>>,
    sets: Mutex<HashMap<String, MemorySet>>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self {
            shutdown_tx: Mutex::default(),
            values: Default::default(),
            sets: Mutex::default(),
        }
    }
}

impl MemoryClient {
    /// Run a closure against a live set, dropping it first if it expired.
    fn with_set<R>(&self, set_key: &str, f: impl FnOnce(Option<&mut MemorySet>) -> R) -> R {
        let mut sets = self.sets.lock().unwrap();
        if sets.get(set_key).is_some_and(MemorySet::is_expired) {
            sets.remove(set_key);
        }
        f(sets.get_mut(set_key))
    }
}

#[async_trait]
impl KeyValueClient for MemoryClient {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let value = self.values.get(&key.to_owned()).await;
        Ok(value.map(|v| v.value().to_owned()))
    }

    async fn set(&self, key: &str, value: String) -> SessionResult<()> {
        self.values
            .insert(key.to_owned(), value, CacheExpiration::none())
            .await;
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, seconds: u64, value: String) -> SessionResult<()> {
        // TTLs past the clock's range never expire
        let expiration = match Instant::now().checked_add(Duration::from_secs(seconds)) {
            Some(at) => CacheExpiration::new(at),
            None => CacheExpiration::none(),
        };
        self.values.insert(key.to_owned(), value, expiration).await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> SessionResult<u64> {
        let mut deleted = 0;
        for key in keys {
            let was_value = self.values.remove(key).await.is_some();
            let was_set = self.sets.lock().unwrap().remove(key).is_some();
            if was_value || was_set {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn set_add(&self, set_key: &str, member: &str) -> SessionResult<()> {
        let mut sets = self.sets.lock().unwrap();
        let set = sets.entry(set_key.to_owned()).or_default();
        if set.is_expired() {
            *set = MemorySet::default();
        }
        set.members.insert(member.to_owned());
        Ok(())
    }

    async fn set_remove(&self, set_key: &str, members: &[String]) -> SessionResult<()> {
        let mut sets = self.sets.lock().unwrap();
        if let Some(set) = sets.get_mut(set_key) {
            for member in members {
                set.members.remove(member);
            }
            if set.members.is_empty() {
                sets.remove(set_key);
            }
        }
        Ok(())
    }

    async fn set_members(&self, set_key: &str) -> SessionResult<Vec<String>> {
        let members: Vec<String> = self.with_set(set_key, |set| {
            set.map(|set| set.members.iter().cloned().collect())
                .unwrap_or_default()
        });
        Ok(members)
    }

    async fn expire(&self, key: &str, seconds: u64) -> SessionResult<()> {
        let expires_at = Instant::now().checked_add(Duration::from_secs(seconds));
        let is_set = self.with_set(key, |set| match set {
            Some(set) => {
                set.expires_at = expires_at;
                true
            }
            None => false,
        });
        if !is_set {
            let value = self
                .values
                .get(&key.to_owned())
                .await
                .map(|v| v.value().to_owned());
            if let Some(value) = value {
                self.set_with_expiry(key, seconds, value).await?;
            }
        }
        Ok(())
    }

    async fn batch_get(&self, keys: &[String]) -> SessionResult<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn setup(&self) -> SessionResult<()> {
        let cache = self.values.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        spawn(async move {
            select! {
                _ = cache.monitor(10, 0.25, Duration::from_secs(5 * 60)) => (),
                _ = shutdown_rx => {
                    tracing::debug!("Session cache monitor shutdown");
                }
            }
        });
        self.shutdown_tx.lock().unwrap().replace(shutdown_tx);
        Ok(())
    }

    async fn shutdown(&self) -> SessionResult<()> {
        if let Some(tx) = self.shutdown_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
