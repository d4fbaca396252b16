//! Marketplace: listings for sale, buying and the dashboard.

pub mod forms;
pub mod models;
pub mod repository;
pub mod urls;
pub mod views;

pub use models::{MarketplaceItem, MarketplaceStatus};
