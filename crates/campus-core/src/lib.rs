//! # campus-core
//!
//! Shared building blocks for the Campus Hub workspace.
//!
//! - [`exception`]: the error taxonomy every crate converts into
//! - [`messages`]: one-shot flash messages shown after a redirect
//! - [`validators`]: form field validators (contact numbers, image uploads)
//!
//! ## Example
//!
//! ```rust
//! use campus_core::exception::Error;
//! use campus_core::validators::validate_contact_info;
//!
//! assert!(validate_contact_info("9876543210").is_ok());
//! assert!(matches!(validate_contact_info("12345"), Err(Error::Validation(_))));
//! ```

pub mod exception;
pub mod messages;
pub mod validators;

pub use exception::{Error, Result};
pub use messages::{Level, Message};
