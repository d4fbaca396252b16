//! Lost & found: reports of lost items, found/claim tagging and the
//! dashboard.

pub mod forms;
pub mod models;
pub mod repository;
pub mod urls;
pub mod views;

pub use models::{LostFoundItem, LostFoundStatus};
