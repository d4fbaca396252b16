//! # campus-http
//!
//! HTTP primitives for Campus Hub: the [`Request`] and [`Response`] types,
//! the [`Handler`] and [`Middleware`] traits, form and multipart parsing,
//! and cookie helpers.
//!
//! ```rust
//! use campus_http::{Handler, Request, Response};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, _request: Request) -> campus_core::Result<Response> {
//!         Ok(Response::ok().with_body("Hello!"))
//!     }
//! }
//! ```

pub mod cookies;
pub mod extensions;
pub mod form;
pub mod logging;
pub mod middleware;
pub mod request;
pub mod response;

pub use cookies::SetCookie;
pub use extensions::Extensions;
pub use form::{FormData, UploadedFile};
pub use logging::LoggingMiddleware;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;

pub use campus_core::{Error, Result};
