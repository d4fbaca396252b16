//! Campus Hub applications.
//!
//! `accounts` owns users and sessions. `lost_and_found` and `marketplace`
//! are the two item kinds; `items` and `catalog` hold what they share.

pub mod accounts;
pub mod catalog;
pub mod items;
pub mod lost_and_found;
pub mod marketplace;
