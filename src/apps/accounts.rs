//! Accounts: users, login, registration with email confirmation, and
//! the profile pages.

pub mod backend;
pub mod models;
pub mod repository;
pub mod urls;
pub mod views;

pub use backend::DatabaseAuthBackend;
pub use models::{GUEST_USERNAME, User};
