//! HTTP request representation

use crate::cookies;
use crate::extensions::Extensions;
use crate::form::FormData;
use bytes::Bytes;
use campus_core::{Error, Result};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::net::SocketAddr;

/// An inbound HTTP request with its body fully buffered.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	/// Values captured from the matched route pattern, e.g. `id` in `/item/<int:id>`.
	pub path_params: HashMap<String, String>,
	pub extensions: Extensions,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			path_params: HashMap::new(),
			extensions: Extensions::new(),
		}
	}

	/// Start building a request, mostly useful in tests.
	///
	/// # Examples
	///
	/// ```
	/// use campus_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/auth/login?next=/marketplace/")
	///     .header("content-type", "application/x-www-form-urlencoded")
	///     .body("username=alice&password=secret")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/auth/login");
	/// assert_eq!(request.query_param("next").as_deref(), Some("/marketplace/"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Path plus query string, as the client requested it.
	pub fn full_path(&self) -> String {
		match self.uri.query() {
			Some(query) => format!("{}?{}", self.uri.path(), query),
			None => self.uri.path().to_string(),
		}
	}

	/// Decoded query parameters. Repeated keys keep the last value.
	pub fn query_params(&self) -> HashMap<String, String> {
		self.uri
			.query()
			.and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
			.map(|pairs| pairs.into_iter().collect())
			.unwrap_or_default()
	}

	pub fn query_param(&self, name: &str) -> Option<String> {
		self.query_params().remove(name)
	}

	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	/// Integer path parameter. A missing or non-numeric value is a 404,
	/// the same as a route that did not match.
	pub fn path_param_i64(&self, name: &str) -> Result<i64> {
		self.path_param(name)
			.and_then(|raw| raw.parse::<i64>().ok())
			.ok_or_else(|| Error::NotFound(format!("No route for {}", self.path())))
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// Value of the named cookie sent by the client.
	pub fn cookie(&self, name: &str) -> Option<String> {
		cookies::parse_cookie_header(&self.headers).remove(name)
	}

	/// Parse the body as `application/x-www-form-urlencoded` or
	/// `multipart/form-data`.
	pub async fn form(&self) -> Result<FormData> {
		FormData::from_request(self).await
	}
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	version: Option<Version>,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append a header. Invalid names or values are ignored.
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.append(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request> {
		let raw_uri = self.uri.unwrap_or_else(|| "/".to_string());
		let uri: Uri = raw_uri
			.parse()
			.map_err(|e| Error::BadRequest(format!("Invalid URI '{}': {}", raw_uri, e)))?;

		let mut request = Request::new(
			self.method.unwrap_or(Method::GET),
			uri,
			self.version.unwrap_or(Version::HTTP_11),
			self.headers,
			self.body,
		);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builder_defaults() {
		let request = Request::builder().build().unwrap();

		assert_eq!(request.method, Method::GET);
		assert_eq!(request.path(), "/");
		assert!(request.body.is_empty());
	}

	#[rstest]
	fn test_query_params_are_decoded() {
		// Arrange
		let request = Request::builder()
			.uri("/auth/login?next=%2Fmarketplace%2Fitem%2F3&q=a+b")
			.build()
			.unwrap();

		// Act
		let params = request.query_params();

		// Assert
		assert_eq!(params.get("next").map(String::as_str), Some("/marketplace/item/3"));
		assert_eq!(params.get("q").map(String::as_str), Some("a b"));
	}

	#[rstest]
	fn test_full_path_keeps_query() {
		let request = Request::builder()
			.uri("/lost-and-found/?page=2")
			.build()
			.unwrap();

		assert_eq!(request.full_path(), "/lost-and-found/?page=2");
	}

	#[rstest]
	#[case(Some("42"), Some(42))]
	#[case(Some("abc"), None)]
	#[case(None, None)]
	fn test_path_param_i64(#[case] raw: Option<&str>, #[case] expected: Option<i64>) {
		// Arrange
		let mut request = Request::builder().uri("/item/x").build().unwrap();
		if let Some(raw) = raw {
			request.set_path_param("id", raw);
		}

		// Act
		let result = request.path_param_i64("id");

		// Assert
		match expected {
			Some(id) => assert_eq!(result.unwrap(), id),
			None => assert!(matches!(result, Err(Error::NotFound(_)))),
		}
	}

	#[rstest]
	fn test_cookie_lookup() {
		let request = Request::builder()
			.header("cookie", "sessionid=abc123; rate_limit=2024-01-01 10:00:00")
			.build()
			.unwrap();

		assert_eq!(request.cookie("sessionid").as_deref(), Some("abc123"));
		assert_eq!(
			request.cookie("rate_limit").as_deref(),
			Some("2024-01-01 10:00:00")
		);
		assert_eq!(request.cookie("missing"), None);
	}

	#[rstest]
	fn test_invalid_uri_is_bad_request() {
		let result = Request::builder().uri("http://[::1").build();

		assert!(matches!(result, Err(Error::BadRequest(_))));
	}
}
