//! Cookie parsing and `Set-Cookie` rendering
//!
//! Parsing and serialization are delegated to the `cookie` crate.

use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use hyper::HeaderMap;
use hyper::header::COOKIE;
use std::collections::HashMap;

/// Collect every cookie sent in the `Cookie` request header(s).
///
/// Malformed pairs are skipped rather than failing the whole request.
pub fn parse_cookie_header(headers: &HeaderMap) -> HashMap<String, String> {
	let mut cookies = HashMap::new();
	for value in headers.get_all(COOKIE) {
		let Ok(raw) = value.to_str() else {
			continue;
		};
		for cookie in Cookie::split_parse(raw).flatten() {
			cookies.insert(cookie.name().to_string(), cookie.value().to_string());
		}
	}
	cookies
}

/// Builder for one `Set-Cookie` header value.
///
/// Defaults to `Path=/`, `HttpOnly` and `SameSite=Lax`.
#[derive(Debug, Clone)]
pub struct SetCookie {
	inner: Cookie<'static>,
}

impl SetCookie {
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		let mut inner = Cookie::new(name.into(), value.into());
		inner.set_path("/");
		inner.set_http_only(true);
		inner.set_same_site(SameSite::Lax);
		Self { inner }
	}

	/// A cookie that tells the client to drop `name` immediately.
	pub fn removal(name: impl Into<String>) -> Self {
		Self::new(name, "").max_age(0)
	}

	pub fn max_age(mut self, seconds: i64) -> Self {
		self.inner.set_max_age(Duration::seconds(seconds));
		self
	}

	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.inner.set_path(path.into());
		self
	}

	pub fn secure(mut self, secure: bool) -> Self {
		self.inner.set_secure(secure);
		self
	}

	pub fn http_only(mut self, http_only: bool) -> Self {
		self.inner.set_http_only(http_only);
		self
	}

	pub fn name(&self) -> &str {
		self.inner.name()
	}

	pub fn value(&self) -> &str {
		self.inner.value()
	}

	/// Render as the value of a `Set-Cookie` header.
	pub fn to_header_value(&self) -> String {
		self.inner.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::header::HeaderValue;
	use rstest::rstest;

	#[rstest]
	fn test_parse_multiple_cookie_headers() {
		// Arrange
		let mut headers = HeaderMap::new();
		headers.append(COOKIE, HeaderValue::from_static("a=1; b=2"));
		headers.append(COOKIE, HeaderValue::from_static("c=3"));

		// Act
		let cookies = parse_cookie_header(&headers);

		// Assert
		assert_eq!(cookies.len(), 3);
		assert_eq!(cookies["a"], "1");
		assert_eq!(cookies["c"], "3");
	}

	#[rstest]
	fn test_parse_skips_garbage() {
		let mut headers = HeaderMap::new();
		headers.insert(COOKIE, HeaderValue::from_static("novalue; ok=yes"));

		let cookies = parse_cookie_header(&headers);

		assert_eq!(cookies.get("ok").map(String::as_str), Some("yes"));
	}

	#[rstest]
	fn test_set_cookie_defaults() {
		let header = SetCookie::new("sessionid", "abc").to_header_value();

		assert!(header.starts_with("sessionid=abc"));
		assert!(header.contains("Path=/"));
		assert!(header.contains("HttpOnly"));
		assert!(header.contains("SameSite=Lax"));
	}

	#[rstest]
	fn test_set_cookie_max_age_and_secure() {
		let header = SetCookie::new("rate_limit", "x")
			.max_age(60)
			.secure(true)
			.to_header_value();

		assert!(header.contains("Max-Age=60"));
		assert!(header.contains("Secure"));
	}

	#[rstest]
	fn test_removal_cookie_expires_now() {
		let header = SetCookie::removal("sessionid").to_header_value();

		assert!(header.starts_with("sessionid="));
		assert!(header.contains("Max-Age=0"));
	}
}
