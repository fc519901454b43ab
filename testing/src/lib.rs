//! Test fixtures shared by the workspace crates.
//!
//! The Redis container is started at most once per test binary and torn
//! down when the process exits. Tests that need it skip themselves when
//! [`redis`] returns `None`.

mod fixtures;

pub use fixtures::{RedisFixture, redis, unique_id, unique_session_id};
