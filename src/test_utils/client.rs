//! In-process HTTP client
//!
//! Requests go straight to the application handler. Cookies set by
//! responses are kept and sent back, like a browser would.

use bytes::Bytes;
use campus_core::Message;
use campus_http::{Handler, Request, Response};
use hyper::{Method, StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;

const BOUNDARY: &str = "campus-hub-test-boundary";

/// An uploaded file for [`TestClient::post_multipart`].
pub struct TestFile<'a> {
	pub field: &'a str,
	pub filename: &'a str,
	pub content_type: &'a str,
	pub data: &'a [u8],
}

pub struct TestClient {
	handler: Arc<dyn Handler>,
	cookies: BTreeMap<String, String>,
	headers: Vec<(String, String)>,
}

impl TestClient {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			cookies: BTreeMap::new(),
			headers: Vec::new(),
		}
	}

	pub fn cookie(&self, name: &str) -> Option<&str> {
		self.cookies.get(name).map(String::as_str)
	}

	pub fn set_cookie(&mut self, name: &str, value: &str) {
		self.cookies.insert(name.to_string(), value.to_string());
	}

	pub fn remove_cookie(&mut self, name: &str) {
		self.cookies.remove(name);
	}

	/// Send `value` as header `name` on every later request.
	pub fn set_header(&mut self, name: &str, value: &str) {
		self.headers.push((name.to_string(), value.to_string()));
	}

	pub async fn get(&mut self, path: &str) -> TestResponse {
		self.send(Method::GET, path, None, Bytes::new()).await
	}

	/// GET the target of a redirect response.
	pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
		let location = response.location().expect("redirect response").to_string();
		self.get(&location).await
	}

	pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
		let body = serde_urlencoded::to_string(fields).expect("urlencode form");
		self.send(
			Method::POST,
			path,
			Some("application/x-www-form-urlencoded".to_string()),
			Bytes::from(body),
		)
		.await
	}

	pub async fn post_multipart(&mut self, path: &str, fields: &[(&str, &str)], files: &[TestFile<'_>]) -> TestResponse {
		let mut body: Vec<u8> = Vec::new();
		for (name, value) in fields {
			body.extend_from_slice(
				format!(
					"--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
					BOUNDARY, name, value
				)
				.as_bytes(),
			);
		}
		for file in files {
			body.extend_from_slice(
				format!(
					"--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
					BOUNDARY, file.field, file.filename, file.content_type
				)
				.as_bytes(),
			);
			body.extend_from_slice(file.data);
			body.extend_from_slice(b"\r\n");
		}
		body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

		self.send(
			Method::POST,
			path,
			Some(format!("multipart/form-data; boundary={}", BOUNDARY)),
			Bytes::from(body),
		)
		.await
	}

	async fn send(&mut self, method: Method, path: &str, content_type: Option<String>, body: Bytes) -> TestResponse {
		let mut builder = Request::builder().method(method).uri(path).body(body);
		if let Some(content_type) = content_type {
			builder = builder.header("content-type", &content_type);
		}
		if !self.cookies.is_empty() {
			let cookie_header = self
				.cookies
				.iter()
				.map(|(name, value)| format!("{}={}", name, value))
				.collect::<Vec<_>>()
				.join("; ");
			builder = builder.header("cookie", &cookie_header);
		}
		for (name, value) in &self.headers {
			builder = builder.header(name, value);
		}
		let request = builder.build().expect("valid test request");

		let response = self
			.handler
			.handle(request)
			.await
			.unwrap_or_else(Response::from);
		self.store_cookies(&response);
		TestResponse { inner: response }
	}

	fn store_cookies(&mut self, response: &Response) {
		for header in response.set_cookies() {
			let (pair, attributes) = header.split_once(';').unwrap_or((header, ""));
			let Some((name, value)) = pair.split_once('=') else {
				continue;
			};
			let expired = attributes
				.split(';')
				.any(|attr| attr.trim().eq_ignore_ascii_case("Max-Age=0"));
			if expired || value.is_empty() {
				self.cookies.remove(name.trim());
			} else {
				self.cookies.insert(name.trim().to_string(), value.trim().to_string());
			}
		}
	}
}

#[derive(Debug)]
pub struct TestResponse {
	inner: Response,
}

impl TestResponse {
	pub fn status(&self) -> StatusCode {
		self.inner.status
	}

	pub fn location(&self) -> Option<&str> {
		self.inner.location()
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.inner.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.inner.body).into_owned()
	}

	pub fn json(&self) -> serde_json::Value {
		serde_json::from_slice(&self.inner.body).expect("JSON response body")
	}

	/// Flash messages rendered into a JSON page.
	pub fn messages(&self) -> Vec<Message> {
		serde_json::from_value(self.json()["messages"].clone()).unwrap_or_default()
	}

	pub fn message_texts(&self) -> Vec<String> {
		self.messages().into_iter().map(|m| m.text).collect()
	}

	pub fn into_inner(self) -> Response {
		self.inner
	}
}
