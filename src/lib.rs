//! # Campus Hub
//!
//! A campus lost & found board and peer-to-peer marketplace.
//!
//! - [`apps::accounts`]: registration with email confirmation, login, the
//!   shared guest account and profiles
//! - [`apps::lost_and_found`]: lost item reports with found/claim tagging
//! - [`apps::marketplace`]: listings that other students can buy
//!
//! Handlers answer with JSON pages or flash-and-redirect responses. Images
//! go to object storage through [`campus_storages::MediaStorage`] and
//! confirmation mail through [`campus_mail::EmailBackend`].

pub mod apps;
pub mod config;
pub mod db;
pub mod shortcuts;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use state::AppState;
