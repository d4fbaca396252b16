//! Shared test support: database and user fixtures, a fully wired test
//! application and an in-process client with a cookie jar.

pub mod client;
pub mod fixtures;

pub use client::{TestClient, TestFile, TestResponse};
pub use fixtures::{TEST_PASSWORD, TestApp, TestUser, migrated_pool, test_now, test_settings};
