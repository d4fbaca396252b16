use crate::middleware::RequestSessionExt;
use async_trait::async_trait;
use campus_core::Result;
use campus_http::{Handler, Request, Response};
use std::marker::PhantomData;
use std::sync::Arc;

pub const LOGIN_URL: &str = "/auth/login";

/// Wraps a handler so anonymous requests are redirected to the login page
/// with `next` set to the requested path.
pub struct LoginRequired<U> {
	inner: Arc<dyn Handler>,
	login_url: String,
	_user: PhantomData<fn() -> U>,
}

impl<U> LoginRequired<U> {
	pub fn new(inner: Arc<dyn Handler>) -> Self {
		Self {
			inner,
			login_url: LOGIN_URL.to_string(),
			_user: PhantomData,
		}
	}

	pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
		self.login_url = url.into();
		self
	}

	fn redirect_url(&self, request: &Request) -> String {
		let query = serde_urlencoded::to_string([("next", request.full_path())]).unwrap_or_default();
		format!("{}?{}", self.login_url, query)
	}
}

/// Shorthand for `Arc::new(LoginRequired::<U>::new(inner))`.
pub fn login_required<U>(inner: Arc<dyn Handler>) -> Arc<dyn Handler>
where
	U: Clone + Send + Sync + 'static,
{
	Arc::new(LoginRequired::<U>::new(inner))
}

#[async_trait]
impl<U> Handler for LoginRequired<U>
where
	U: Clone + Send + Sync + 'static,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.current_user::<U>().is_authenticated() {
			return self.inner.handle(request).await;
		}
		tracing::debug!(path = %request.path(), "anonymous request redirected to login");
		Ok(Response::temporary_redirect(self.redirect_url(&request)))
	}
}

/// Whether `next` is safe to redirect to after login: a local absolute
/// path, never a scheme-relative `//host` or a backslash variant of it.
pub fn is_safe_next(next: &str) -> bool {
	next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::current_user::CurrentUser;
	use hyper::StatusCode;
	use rstest::rstest;

	struct Ok200;

	#[async_trait]
	impl Handler for Ok200 {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok())
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_anonymous_redirects_with_next() {
		// Arrange
		let handler = LoginRequired::<String>::new(Arc::new(Ok200));
		let request = Request::builder()
			.uri("/marketplace/item/3?tab=x")
			.build()
			.unwrap();

		// Act
		let response = handler.handle(request).await.unwrap();

		// Assert
		assert_eq!(response.status, StatusCode::FOUND);
		assert_eq!(
			response.location(),
			Some("/auth/login?next=%2Fmarketplace%2Fitem%2F3%3Ftab%3Dx")
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_authenticated_passes_through() {
		let handler = LoginRequired::<String>::new(Arc::new(Ok200));
		let request = Request::builder().uri("/marketplace/").build().unwrap();
		request
			.extensions
			.insert(CurrentUser::authenticated("alice".to_string()));

		let response = handler.handle(request).await.unwrap();

		assert_eq!(response.status, StatusCode::OK);
	}

	#[rstest]
	#[case("/marketplace/", true)]
	#[case("/lost-and-found/item/2", true)]
	#[case("//evil.example", false)]
	#[case("/\\evil.example", false)]
	#[case("https://evil.example", false)]
	#[case("", false)]
	fn test_is_safe_next(#[case] next: &str, #[case] expected: bool) {
		assert_eq!(is_safe_next(next), expected);
	}
}
