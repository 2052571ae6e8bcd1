//! Shared interface for key-value clients

use async_trait::async_trait;

use crate::{error::SessionResult, events::EventSender};

/// The minimal set of key-value commands the session store relies on. You can
/// back the store with your own client by implementing this trait.
///
/// Values are opaque strings; the store handles (de)serialization.
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    /// Fetch the value at `key`, or `None` if it doesn't exist (or expired).
    async fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Write a value without expiration.
    async fn set(&self, key: &str, value: String) -> SessionResult<()>;

    /// Write a value that expires after `seconds`.
    async fn set_with_expiry(&self, key: &str, seconds: u64, value: String) -> SessionResult<()>;

    /// Delete the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> SessionResult<u64>;

    /// Add a member to the set at `set_key`.
    async fn set_add(&self, set_key: &str, member: &str) -> SessionResult<()>;

    /// Remove members from the set at `set_key`.
    async fn set_remove(&self, set_key: &str, members: &[String]) -> SessionResult<()>;

    /// All members of the set at `set_key`. A missing set is empty.
    async fn set_members(&self, set_key: &str) -> SessionResult<Vec<String>>;

    /// Set an expiration (in seconds) on an existing key.
    async fn expire(&self, key: &str, seconds: u64) -> SessionResult<()>;

    /// Fetch several keys in a single round trip. The result must contain
    /// exactly one entry per key, in the same order.
    async fn batch_get(&self, keys: &[String]) -> SessionResult<Vec<Option<String>>>;

    /// Wire the client's connection notifications to the store. Called once
    /// when the store is constructed.
    #[allow(unused_variables, reason = "Public trait function with default no-op")]
    fn forward_events(&self, events: EventSender) {
        // Default no-op
    }

    /// Optional setup of resources (e.g. background tasks)
    async fn setup(&self) -> SessionResult<()> {
        Ok(()) // Default no-op
    }

    /// Optional teardown of resources
    async fn shutdown(&self) -> SessionResult<()> {
        Ok(()) // Default no-op
    }
}

#[async_trait]
impl<C> KeyValueClient for Box<C>
where
    C: KeyValueClient + ?Sized,
{
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> SessionResult<()> {
        (**self).set(key, value).await
    }

    async fn set_with_expiry(&self, key: &str, seconds: u64, value: String) -> SessionResult<()> {
        (**self).set_with_expiry(key, seconds, value).await
    }

    async fn delete(&self, keys: &[String]) -> SessionResult<u64> {
        (**self).delete(keys).await
    }

    async fn set_add(&self, set_key: &str, member: &str) -> SessionResult<()> {
        (**self).set_add(set_key, member).await
    }

    async fn set_remove(&self, set_key: &str, members: &[String]) -> SessionResult<()> {
        (**self).set_remove(set_key, members).await
    }

    async fn set_members(&self, set_key: &str) -> SessionResult<Vec<String>> {
        (**self).set_members(set_key).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> SessionResult<()> {
        (**self).expire(key, seconds).await
    }

    async fn batch_get(&self, keys: &[String]) -> SessionResult<Vec<Option<String>>> {
        (**self).batch_get(keys).await
    }

    fn forward_events(&self, events: EventSender) {
        (**self).forward_events(events)
    }

    async fn setup(&self) -> SessionResult<()> {
        (**self).setup().await
    }

    async fn shutdown(&self) -> SessionResult<()> {
        (**self).shutdown().await
    }
}
