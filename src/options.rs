use bon::Builder;
use serde::Deserialize;

/// Options for connecting the session store to Redis.
///
/// Build them in code with [`SessionStoreOptions::builder`], or deserialize
/// them from your application's config (missing fields use the defaults).
///
/// ```rust
/// use redis_session_store::SessionStoreOptions;
///
/// let options = SessionStoreOptions::builder()
///     .host("redis.internal")
///     .db(2)
///     .prefix("koa:sess:")
///     .build();
/// assert_eq!(options.port, 6379);
/// ```
#[derive(Builder, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionStoreOptions {
    /// Redis host (default: `"localhost"`)
    #[builder(into, default = "localhost")]
    pub host: String,
    /// Redis port (default: `6379`)
    #[builder(default = 6379)]
    pub port: u16,
    /// Path to a Unix socket. When set, `host` and `port` are ignored.
    #[builder(into)]
    pub socket: Option<String>,
    /// Logical database to select on every (re)connect
    pub db: Option<u8>,
    /// Password to authenticate with on every (re)connect
    #[builder(into)]
    pub pass: Option<String>,
    /// Prefix of the user session index keys, also stripped from session IDs
    /// returned by index queries (default: `""`)
    #[builder(into, default)]
    pub prefix: String,
    /// Number of connections in the Redis pool (default: `1`)
    #[builder(default = 1)]
    pub pool_size: usize,
    /// Optional TTL in seconds refreshed on a user's session index whenever a
    /// session is added to it. Should match your longest expected session duration.
    pub user_sessions_ttl: Option<u32>,
}

impl Default for SessionStoreOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}
