//! HTTP/1.1 server for Campus Hub.
//!
//! ```rust,ignore
//! use campus_server::HttpServer;
//! use std::sync::Arc;
//!
//! let server = HttpServer::new(Arc::new(router))
//!     .with_middleware(Arc::new(LoggingMiddleware::new()));
//! server.listen_with_shutdown(addr, shutdown_signal()).await?;
//! ```

pub mod http;

pub use http::{HttpServer, ServerError, shutdown_signal};
