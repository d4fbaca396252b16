//! Middleware and handler traits for HTTP request processing.
//!
//! ## Middleware
//!
//! Middleware wraps handlers to add cross-cutting concerns such as the
//! session, the current user, or request logging:
//!
//! ```rust
//! use campus_http::{Handler, Middleware, Request, Response};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct PoweredBy;
//!
//! #[async_trait]
//! impl Middleware for PoweredBy {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> campus_core::Result<Response> {
//!         let response = next.handle(request).await?;
//!         Ok(response.with_header("x-powered-by", "campus-hub"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use campus_core::Result;
use std::sync::Arc;

use crate::{Request, Response};

/// Handler trait for processing requests.
///
/// Handlers receive a request and produce a response or an error.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Middleware trait for request/response processing.
///
/// Middleware can modify requests before passing to the next handler,
/// or modify responses after the handler processes the request.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;

	/// Whether this middleware runs for `request`. Defaults to always.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

/// Composes middleware around a final handler.
///
/// Middleware run in the order they were added: the first one added sees
/// the request first and the response last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		if self.middlewares.is_empty() {
			return self.handler.handle(request).await;
		}

		let mut current_handler = self.handler.clone();

		let active_middlewares: Vec<_> = self
			.middlewares
			.iter()
			.rev()
			.filter(|mw| mw.should_continue(&request))
			.collect();

		for middleware in active_middlewares {
			current_handler = Arc::new(ComposedHandler {
				middleware: middleware.clone(),
				next: current_handler,
			});
		}

		current_handler.handle(request).await
	}
}

struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::Method;
	use rstest::rstest;

	struct MockHandler {
		response_body: String,
	}

	#[async_trait]
	impl Handler for MockHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_body(self.response_body.clone()))
		}
	}

	struct PrefixMiddleware {
		prefix: String,
	}

	#[async_trait]
	impl Middleware for PrefixMiddleware {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			let response = next.handle(request).await?;
			let current_body = String::from_utf8(response.body.to_vec()).unwrap_or_default();
			Ok(Response::ok().with_body(format!("{}{}", self.prefix, current_body)))
		}
	}

	struct StaticOnly;

	#[async_trait]
	impl Middleware for StaticOnly {
		async fn process(&self, _request: Request, _next: Arc<dyn Handler>) -> Result<Response> {
			Ok(Response::ok().with_body("static").with_stop_chain(true))
		}

		fn should_continue(&self, request: &Request) -> bool {
			request.path().starts_with("/static/")
		}
	}

	fn request(path: &str) -> Request {
		Request::builder()
			.method(Method::GET)
			.uri(path)
			.build()
			.unwrap()
	}

	fn handler() -> Arc<dyn Handler> {
		Arc::new(MockHandler {
			response_body: "body".to_string(),
		})
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_chain_calls_handler() {
		let chain = MiddlewareChain::new(handler());

		let response = chain.handle(request("/")).await.unwrap();

		assert_eq!(response.body, "body");
	}

	#[rstest]
	#[tokio::test]
	async fn test_first_added_runs_outermost() {
		// Arrange
		let chain = MiddlewareChain::new(handler())
			.with_middleware(Arc::new(PrefixMiddleware {
				prefix: "outer-".to_string(),
			}))
			.with_middleware(Arc::new(PrefixMiddleware {
				prefix: "inner-".to_string(),
			}));

		// Act
		let response = chain.handle(request("/")).await.unwrap();

		// Assert
		assert_eq!(response.body, "outer-inner-body");
	}

	#[rstest]
	#[case("/static/app.css", "static")]
	#[case("/marketplace/", "body")]
	#[tokio::test]
	async fn test_conditional_middleware(#[case] path: &str, #[case] expected: &str) {
		let mut chain = MiddlewareChain::new(handler());
		chain.add_middleware(Arc::new(StaticOnly));

		let response = chain.handle(request(path)).await.unwrap();

		assert_eq!(response.body, expected);
	}
}
