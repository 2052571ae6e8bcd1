//! Key-value clients the session store can run on

mod interface;
pub use interface::*;

pub mod memory;

#[cfg(feature = "redis_fred")]
pub mod redis;
