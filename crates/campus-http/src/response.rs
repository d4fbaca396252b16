use crate::cookies::SetCookie;
use bytes::Bytes;
use campus_core::{Error, Result};
use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP Response representation
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// When true, remaining middleware and the handler are skipped.
	stop_chain: bool,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use campus_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			stop_chain: false,
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn forbidden() -> Self {
		Self::new(StatusCode::FORBIDDEN)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Create a Response with HTTP 301 Moved Permanently
	pub fn permanent_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::MOVED_PERMANENTLY).with_location(location.as_ref())
	}

	/// Create a Response with HTTP 302 Found (temporary redirect)
	///
	/// # Examples
	///
	/// ```
	/// use campus_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::temporary_redirect("/lost-and-found/");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.location(), Some("/lost-and-found/"));
	/// ```
	pub fn temporary_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_location(location.as_ref())
	}

	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header, replacing any previous value. Invalid names or values
	/// are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(LOCATION, value);
		}
		self
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	/// Plain text body offered as a download named `filename`.
	pub fn attachment(body: impl Into<String>, filename: &str) -> Self {
		Self::ok()
			.with_body(body.into())
			.with_header(CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
			.with_header(
				CONTENT_DISPOSITION.as_str(),
				&format!("attachment; filename={}", filename),
			)
	}

	/// Append a `Set-Cookie` header. Several cookies may be set on one
	/// response, so this never replaces an earlier one.
	pub fn with_cookie(mut self, cookie: &SetCookie) -> Self {
		self.add_cookie(cookie);
		self
	}

	pub fn add_cookie(&mut self, cookie: &SetCookie) {
		if let Ok(value) = HeaderValue::from_str(&cookie.to_header_value()) {
			self.headers.append(SET_COOKIE, value);
		}
	}

	pub fn location(&self) -> Option<&str> {
		self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
	}

	/// All `Set-Cookie` values on this response.
	pub fn set_cookies(&self) -> Vec<&str> {
		self.headers
			.get_all(SET_COOKIE)
			.iter()
			.filter_map(|v| v.to_str().ok())
			.collect()
	}

	pub fn is_redirect(&self) -> bool {
		self.status.is_redirection()
	}

	pub fn should_stop_chain(&self) -> bool {
		self.stop_chain
	}

	pub fn with_stop_chain(mut self, stop: bool) -> Self {
		self.stop_chain = stop;
		self
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		if error.is_server_error() {
			tracing::error!(error = %error, "request failed");
		} else {
			tracing::debug!(error = %error, "request rejected");
		}

		let body = serde_json::json!({
			"error": error.public_message(),
		});

		Response::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error())
	}
}
