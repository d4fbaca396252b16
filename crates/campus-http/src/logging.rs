use crate::{Handler, Middleware, Request, Response};
use async_trait::async_trait;
use campus_core::Result;
use std::sync::Arc;
use std::time::Instant;

/// Logs method, path, status code and latency of every request.
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for LoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Instant::now();
		let method = request.method.to_string();
		let path = request.path().to_string();

		let result = next.handle(request).await;

		let elapsed_ms = start.elapsed().as_millis() as u64;
		match &result {
			Ok(response) => {
				tracing::info!(
					%method,
					%path,
					status = response.status.as_u16(),
					elapsed_ms,
					"request completed"
				);
			}
			Err(err) if err.is_server_error() => {
				tracing::error!(%method, %path, error = %err, elapsed_ms, "request failed");
			}
			Err(err) => {
				tracing::warn!(
					%method,
					%path,
					status = err.status_code(),
					error = %err,
					elapsed_ms,
					"request rejected"
				);
			}
		}

		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use campus_core::Error;
	use hyper::StatusCode;
	use rstest::rstest;

	struct Fixed(Option<StatusCode>);

	#[async_trait]
	impl Handler for Fixed {
		async fn handle(&self, _request: Request) -> Result<Response> {
			match self.0 {
				Some(status) => Ok(Response::new(status)),
				None => Err(Error::NotFound("gone".into())),
			}
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_passes_response_through() {
		let request = Request::builder().uri("/marketplace/").build().unwrap();

		let response = LoggingMiddleware::new()
			.process(request, Arc::new(Fixed(Some(StatusCode::CREATED))))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::CREATED);
	}

	#[rstest]
	#[tokio::test]
	async fn test_passes_error_through() {
		let request = Request::builder().uri("/missing").build().unwrap();

		let result = LoggingMiddleware::new()
			.process(request, Arc::new(Fixed(None)))
			.await;

		assert!(matches!(result, Err(Error::NotFound(_))));
	}
}
