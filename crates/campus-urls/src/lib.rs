//! # campus-urls
//!
//! URL routing: [`PathPattern`] compiles `<name>` / `<int:name>` patterns,
//! [`Router`] dispatches on path and method, and [`handler_fn`] turns an
//! async function taking shared state into a [`campus_http::Handler`].
//!
//! A path that matches but with the wrong method yields `405` with an
//! `Allow` header. An unknown path yields [`campus_core::Error::NotFound`].

pub mod handler;
pub mod pattern;
pub mod router;

pub use handler::{FnHandler, handler_fn};
pub use pattern::PathPattern;
pub use router::{Route, Router};
