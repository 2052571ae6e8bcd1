use std::time::Duration;

use tokio::sync::broadcast;

use crate::{
    client::KeyValueClient,
    error::SessionResult,
    events::{EventSender, StoreEvent},
    SessionRecord,
};

/**
Session store over a key-value client.

Sessions are stored as JSON strings under their session ID, as given by the
caller. Authenticated sessions (with a `passport.user` field) are also tracked
in a per-user Redis set under `<prefix>user_sessions:<user id>`, which can be
queried with [`SessionStore::all_user_sessions`].

The user index is maintained on a best-effort basis: destroyed or expired
sessions stay in it until the next index query, which removes them.

```rust
use std::time::Duration;

use redis_session_store::{client::memory::MemoryClient, SessionRecord, SessionStore};

# #[tokio::main(flavor = "current_thread")]
# async fn main() -> redis_session_store::error::SessionResult<()> {
let store = SessionStore::new(MemoryClient::default(), "sess:");

let mut session = SessionRecord::new();
session.set_user_id("alice");
store.set("sess:abc", &session, Some(Duration::from_secs(3600))).await?;

let sessions = store.all_user_sessions("alice").await?;
assert_eq!(sessions[0].sid(), Some("abc"));
# Ok(())
# }
```
*/
pub struct SessionStore<C> {
    pub(crate) client: C,
    pub(crate) prefix: String,
    pub(crate) user_sessions_ttl: Option<u32>,
    events: EventSender,
}

impl<C> SessionStore<C>
where
    C: KeyValueClient,
{
    /// Create the store around a client. `prefix` is used for the user session
    /// index keys, and stripped from session IDs returned by index queries.
    pub fn new(client: C, prefix: &str) -> Self {
        let events = EventSender::new();
        client.forward_events(events.clone());
        Self {
            client,
            prefix: prefix.to_owned(),
            user_sessions_ttl: None,
            events,
        }
    }

    /// Refresh an expiration (in seconds) on a user's session index whenever
    /// a session is added to it.
    pub fn with_user_sessions_ttl(mut self, ttl: u32) -> Self {
        self.user_sessions_ttl = Some(ttl);
        self
    }

    /// The underlying key-value client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Subscribe to connection notifications from the client.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Load a session. Missing sessions, and stored values that can't be parsed
    /// as a session, both yield `None`.
    pub async fn get(&self, sid: &str) -> SessionResult<Option<SessionRecord>> {
        let data = self.client.get(sid).await?;
        tracing::debug!("get session: {}", data.as_deref().unwrap_or("none"));
        let Some(data) = data else {
            return Ok(None);
        };
        match SessionRecord::parse(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::debug!("parse session error: {e}");
                Ok(None)
            }
        }
    }

    /// Save a session. A `ttl` is rounded up to whole seconds; `None` or a zero
    /// duration stores the session without expiration.
    ///
    /// If the session belongs to a user, the session ID is added to that user's
    /// index before the session itself is written.
    pub async fn set(
        &self,
        sid: &str,
        session: &SessionRecord,
        ttl: Option<Duration>,
    ) -> SessionResult<()> {
        if let Some(user_id) = session.user_id() {
            self.track_user_session(&user_id, sid).await;
        }

        let value = session.to_json()?;
        match ttl.map(expiry_seconds).filter(|secs| *secs > 0) {
            Some(secs) => {
                tracing::debug!("SETEX {sid} {secs} {value}");
                self.client.set_with_expiry(sid, secs, value).await?;
            }
            None => {
                tracing::debug!("SET {sid} {value}");
                self.client.set(sid, value).await?;
            }
        }
        tracing::debug!("SET {sid} complete");
        Ok(())
    }

    /// Delete a session. The user index isn't touched; stale entries are
    /// removed by the next index query.
    pub async fn destroy(&self, sid: &str) -> SessionResult<()> {
        tracing::debug!("DEL {sid}");
        self.client.delete(&[sid.to_owned()]).await?;
        tracing::debug!("DEL {sid} complete");
        Ok(())
    }

    /// Setup of client resources. Should be called on application startup.
    pub async fn setup(&self) -> SessionResult<()> {
        self.client.setup().await
    }

    /// Teardown of client resources. Should be called on application shutdown.
    pub async fn shutdown(&self) -> SessionResult<()> {
        self.client.shutdown().await
    }

    pub(crate) fn user_sessions_key(&self, user_id: &str) -> String {
        format!("{}user_sessions:{user_id}", self.prefix)
    }

    pub(crate) fn drop_prefix<'a>(&self, sid: &'a str) -> &'a str {
        sid.strip_prefix(self.prefix.as_str()).unwrap_or(sid)
    }

    /// Add the session to the user's index. Index maintenance is best-effort,
    /// so failures are logged rather than returned.
    async fn track_user_session(&self, user_id: &str, sid: &str) {
        let index_key = self.user_sessions_key(user_id);
        tracing::debug!("SADD {index_key} {sid}");
        if let Err(e) = self.client.set_add(&index_key, sid).await {
            tracing::warn!("Failed to add session {sid} to {index_key}: {e}");
            return;
        }
        if let Some(ttl) = self.user_sessions_ttl {
            if let Err(e) = self.client.expire(&index_key, ttl.into()).await {
                tracing::warn!("Failed to refresh TTL of {index_key}: {e}");
            }
        }
    }
}

#[cfg(feature = "redis_fred")]
impl SessionStore<crate::client::redis::FredClient> {
    /// Build a Redis connection pool from the options and connect it.
    /// Connection or authentication failures are returned as errors.
    pub async fn connect(options: crate::SessionStoreOptions) -> SessionResult<Self> {
        let client = crate::client::redis::FredClient::from_options(&options)?;
        let mut store = Self::new(client, &options.prefix);
        store.user_sessions_ttl = options.user_sessions_ttl;
        store.client.init().await?;
        store.events.send(StoreEvent::Connect);
        Ok(store)
    }
}

/// Whole seconds for a TTL, rounded up.
pub(crate) fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::client::memory::MemoryClient;

    #[test_case(1 => 1; "one millisecond")]
    #[test_case(999 => 1; "under a second")]
    #[test_case(1000 => 1; "exactly a second")]
    #[test_case(1001 => 2; "just over a second")]
    #[test_case(86_400_000 => 86_400; "a day")]
    #[test_case(0 => 0; "zero")]
    fn expiry_seconds_rounds_up(millis: u64) -> u64 {
        expiry_seconds(Duration::from_millis(millis))
    }

    #[test]
    fn expiry_seconds_saturates() {
        assert_eq!(expiry_seconds(Duration::MAX), u64::MAX);
        assert_eq!(expiry_seconds(Duration::new(u64::MAX, 0)), u64::MAX);
    }

    #[test]
    fn drop_prefix_only_strips_leading_prefix() {
        let store = SessionStore::new(MemoryClient::default(), "koa:");
        assert_eq!(store.drop_prefix("koa:abc"), "abc");
        assert_eq!(store.drop_prefix("abc:koa:"), "abc:koa:");
        assert_eq!(store.user_sessions_key("42"), "koa:user_sessions:42");
    }
}
