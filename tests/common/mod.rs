#![allow(dead_code)]

use std::{future::Future, pin::Pin};

use fred::prelude::{Builder, ClientLike, Config, KeysInterface, ReconnectPolicy};
use redis_session_store::{
    client::{memory::MemoryClient, redis::FredClient, KeyValueClient},
    SessionRecord, SessionStore,
};
use serde_json::json;

/// Set this to a Redis URL (e.g. `redis://localhost`) to also run the tests against Redis
pub const REDIS_URL_VAR: &str = "TEST_REDIS_URL";

pub type TestStore = SessionStore<Box<dyn KeyValueClient>>;
pub type Cleanup = Pin<Box<dyn Future<Output = ()>>>;

pub fn random_string(n: usize) -> String {
    (0..n)
        .map(|_| (b'a' + (rand::random::<u8>() % 26)) as char)
        .collect()
}

/// An authenticated session for the given user
pub fn user_session(user_id: &str, data: &str) -> SessionRecord {
    SessionRecord::try_from(json!({
        "passport": { "user": user_id },
        "data": data,
    }))
    .unwrap()
}

/// A session without a logged in user
pub fn anonymous_session(data: &str) -> SessionRecord {
    SessionRecord::try_from(json!({ "passport": {}, "data": data })).unwrap()
}

/// Create a store for the test case, with a random key prefix. Returns `None`
/// if the backend isn't available.
pub async fn create_store(storage_case: &str) -> Option<(TestStore, String, Option<Cleanup>)> {
    let prefix = format!("test_{}:sess:", random_string(6));
    match storage_case {
        "memory" => {
            let client: Box<dyn KeyValueClient> = Box::new(MemoryClient::default());
            Some((SessionStore::new(client, &prefix), prefix, None))
        }
        "redis" => {
            let Ok(url) = std::env::var(REDIS_URL_VAR) else {
                eprintln!("{REDIS_URL_VAR} not set, skipping Redis test");
                return None;
            };
            let pool = setup_redis_fred(&url).await;
            let client: Box<dyn KeyValueClient> = Box::new(FredClient::new(pool.clone()));
            let cleanup = Box::pin(teardown_redis_fred(pool, prefix.clone()));
            Some((SessionStore::new(client, &prefix), prefix, Some(cleanup)))
        }
        _ => unimplemented!(),
    }
}

pub async fn setup_redis_fred(url: &str) -> fred::prelude::Pool {
    let pool = Builder::from_config(Config::from_url(url).expect("Valid Redis URL"))
        .set_policy(ReconnectPolicy::new_linear(3, 5, 1))
        .with_performance_config(|c| c.default_command_timeout = std::time::Duration::from_secs(5))
        .build_pool(3)
        .expect("Should build Redis pool");
    pool.init().await.expect("Should initialize Redis pool");
    pool
}

pub async fn teardown_redis_fred(pool: fred::prelude::Pool, prefix: String) {
    let (_cursor, keys): (String, Vec<String>) = pool
        .scan_page("0", format!("{prefix}*"), Some(100), None)
        .await
        .expect("Should scan keys");
    if !keys.is_empty() {
        let _: () = pool.del(keys).await.expect("Should delete keys");
    }
    pool.quit().await.expect("Should quit Redis pool");
}
