#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

/*!
# Overview
Session store backed by Redis, with an index of each user's sessions.

- Sessions are JSON documents ([`SessionRecord`]) stored as Redis strings under
  their session ID, with an optional TTL.
- Authenticated sessions (those with a `passport.user` field) are tracked in a
  per-user Redis set, so you can list every active session of a user
  (e.g. for multi-device login tracking) or log a user out everywhere.
- The user index heals itself: destroyed, expired, corrupt or logged-out sessions
  are pruned from it the next time it's queried, rather than eagerly.
- The store runs on any [`KeyValueClient`](crate::client::KeyValueClient). A Redis
  client using [fred.rs](https://docs.rs/fred) and an in-memory client for
  development and tests are included.

# Usage

## Connecting to Redis

```rust,no_run
use std::time::Duration;

use redis_session_store::{SessionRecord, SessionStore, SessionStoreOptions, StoreEvent};

# async fn run() -> redis_session_store::error::SessionResult<()> {
let options = SessionStoreOptions::builder()
    .host("localhost")
    .port(6379)
    .db(1)
    .prefix("koa:sess:")
    .build();
let store = SessionStore::connect(options).await?;

// Get notified when the connection drops or comes back
let mut events = store.subscribe();
tokio::spawn(async move {
    while let Ok(event) = events.recv().await {
        if event == StoreEvent::Disconnect {
            eprintln!("Session store disconnected");
        }
    }
});

let mut session = SessionRecord::new();
session.set_user_id("42");
store
    .set("koa:sess:abc", &session, Some(Duration::from_secs(24 * 60 * 60)))
    .await?;
# Ok(())
# }
```

## Session operations

- [`SessionStore::get`] loads a session. Missing sessions _and_ unparseable values
  yield `None`.
- [`SessionStore::set`] saves a session, rounding the TTL up to whole seconds. A
  missing or zero TTL stores the session without expiration.
- [`SessionStore::destroy`] deletes a session. The user index isn't updated;
  the next index query will drop the stale entry.

## User session index

User sets are stored under `<prefix>user_sessions:<user id>`.

- [`SessionStore::all_user_sessions`] returns each active session of a user, with
  its session ID (minus the prefix) in the record's `sid` field.
- [`SessionStore::user_session_ids`] returns just the session IDs.
- [`SessionStore::destroy_user_sessions`] logs a user out everywhere, optionally
  keeping the current session.

Index maintenance is best-effort and never transactional: index updates that fail
are logged, and the reads reconcile whatever is left behind.

# Custom clients

To run the store on another key-value client, implement the
[`KeyValueClient`](crate::client::KeyValueClient) trait. Use
[`error::SessionError::Backend`] for your client's errors, and forward its
connection notifications in
[`KeyValueClient::forward_events`](crate::client::KeyValueClient::forward_events).

# Feature flags

| Name    | Description    |
|---------|----------------|
| `redis_fred` (default) | A Redis client using the [fred.rs](https://docs.rs/crate/fred) crate. |
*/

mod events;
mod options;
mod record;
mod session_index;
mod store;

pub mod client;
pub mod error;
pub use events::{EventSender, StoreEvent};
pub use options::SessionStoreOptions;
pub use record::SessionRecord;
pub use store::SessionStore;
