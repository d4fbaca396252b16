//! Form body parsing
//!
//! Handles `application/x-www-form-urlencoded` and `multipart/form-data`.
//! Multipart file parts are kept in memory as [`UploadedFile`].

use crate::request::Request;
use bytes::Bytes;
use campus_core::{Error, Result};
use futures_util::future::ready;
use futures_util::stream::once;
use hyper::header::CONTENT_TYPE;
use std::collections::HashMap;
use std::str::FromStr;

/// Maximum accepted form body: 10 MiB
pub const MAX_FORM_BODY_SIZE: usize = 10 * 1024 * 1024;

/// A file part from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
	/// Filename as sent by the client. Not sanitized.
	pub filename: String,
	pub content_type: Option<String>,
	pub data: Bytes,
}

impl UploadedFile {
	pub fn size(&self) -> usize {
		self.data.len()
	}
}

/// Parsed form fields and files.
#[derive(Debug, Clone, Default)]
pub struct FormData {
	fields: HashMap<String, String>,
	files: HashMap<String, UploadedFile>,
}

impl FormData {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.fields.insert(name.into(), value.into());
		self
	}

	pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
		self.files.insert(name.into(), file);
		self
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	/// Field value, or an empty string when absent.
	pub fn get_or_empty(&self, name: &str) -> &str {
		self.get(name).unwrap_or_default()
	}

	/// Field value that must be present and non-blank.
	pub fn required(&self, name: &str) -> Result<&str> {
		match self.get(name) {
			Some(value) if !value.trim().is_empty() => Ok(value),
			_ => Err(Error::Validation(format!(
				"Missing required field: {}",
				name
			))),
		}
	}

	/// Parse a required field.
	pub fn parse<T>(&self, name: &str) -> Result<T>
	where
		T: FromStr,
	{
		let raw = self.required(name)?;
		raw.trim()
			.parse::<T>()
			.map_err(|_| Error::Validation(format!("Invalid value for field: {}", name)))
	}

	/// Uploaded file for `name`. A file input left empty by the browser
	/// (no filename, no bytes) counts as absent.
	pub fn file(&self, name: &str) -> Option<&UploadedFile> {
		self.files
			.get(name)
			.filter(|f| !f.filename.is_empty() || !f.data.is_empty())
	}

	pub(crate) async fn from_request(request: &Request) -> Result<Self> {
		let content_type = request.header(CONTENT_TYPE.as_str()).unwrap_or("");

		if request.body.len() > MAX_FORM_BODY_SIZE {
			return Err(Error::PayloadTooLarge(format!(
				"Form body size {} bytes exceeds maximum allowed size of {} bytes",
				request.body.len(),
				MAX_FORM_BODY_SIZE
			)));
		}

		if content_type.starts_with("multipart/form-data") {
			Self::from_multipart(content_type, request.body.clone()).await
		} else if content_type.starts_with("application/x-www-form-urlencoded")
			|| (content_type.is_empty() && !request.body.is_empty())
		{
			Self::from_urlencoded(&request.body)
		} else if request.body.is_empty() {
			Ok(Self::new())
		} else {
			Err(Error::BadRequest(format!(
				"Expected application/x-www-form-urlencoded or multipart/form-data, got {}",
				content_type
			)))
		}
	}

	fn from_urlencoded(body: &[u8]) -> Result<Self> {
		let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
			.map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))?;
		Ok(Self {
			fields: pairs.into_iter().collect(),
			files: HashMap::new(),
		})
	}

	async fn from_multipart(content_type: &str, body: Bytes) -> Result<Self> {
		let boundary = multer::parse_boundary(content_type)
			.map_err(|e| Error::BadRequest(format!("Failed to parse boundary: {}", e)))?;

		let stream = once(ready(Ok::<_, std::io::Error>(body)));
		let mut multipart = multer::Multipart::new(stream, boundary);

		let mut form = Self::new();
		while let Some(field) = multipart
			.next_field()
			.await
			.map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
		{
			let Some(name) = field.name().map(str::to_string) else {
				continue;
			};

			match field.file_name().map(str::to_string) {
				Some(filename) => {
					let content_type = field.content_type().map(|m| m.to_string());
					let data = field.bytes().await.map_err(|e| {
						Error::BadRequest(format!("Failed to read file field: {}", e))
					})?;
					form.files.insert(
						name,
						UploadedFile {
							filename,
							content_type,
							data,
						},
					);
				}
				None => {
					let text = field.text().await.map_err(|e| {
						Error::BadRequest(format!("Failed to read text field: {}", e))
					})?;
					form.fields.insert(name, text);
				}
			}
		}

		Ok(form)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::Method;
	use rstest::rstest;

	fn multipart_request(boundary: &str, body: String) -> Request {
		Request::builder()
			.method(Method::POST)
			.uri("/upload")
			.header(
				"content-type",
				&format!("multipart/form-data; boundary={}", boundary),
			)
			.body(body)
			.build()
			.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_urlencoded_fields() {
		// Arrange
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "application/x-www-form-urlencoded")
			.body("username=alice&password=s%26cret&confirm_password=")
			.build()
			.unwrap();

		// Act
		let form = request.form().await.unwrap();

		// Assert
		assert_eq!(form.get("username"), Some("alice"));
		assert_eq!(form.get("password"), Some("s&cret"));
		assert!(form.required("confirm_password").is_err());
	}

	#[rstest]
	#[tokio::test]
	async fn test_multipart_fields_and_file() {
		// Arrange
		let boundary = "XBOUNDARY";
		let body = format!(
			"--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nWallet\r\n\
			 --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"w.png\"\r\n\
			 Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
			b = boundary
		);
		let request = multipart_request(boundary, body);

		// Act
		let form = request.form().await.unwrap();

		// Assert
		assert_eq!(form.get("name"), Some("Wallet"));
		let file = form.file("image").unwrap();
		assert_eq!(file.filename, "w.png");
		assert_eq!(file.content_type.as_deref(), Some("image/png"));
		assert_eq!(&file.data[..], b"PNGDATA");
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_file_input_is_absent() {
		let boundary = "B";
		let body = format!(
			"--{b}\r\nContent-Disposition: form-data; name=\"image_path\"; filename=\"\"\r\n\
			 Content-Type: application/octet-stream\r\n\r\n\r\n--{b}--\r\n",
			b = boundary
		);
		let request = multipart_request(boundary, body);

		let form = request.form().await.unwrap();

		assert!(form.file("image_path").is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_oversized_body_rejected() {
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "application/x-www-form-urlencoded")
			.body(vec![b'a'; MAX_FORM_BODY_SIZE + 1])
			.build()
			.unwrap();

		let result = request.form().await;

		assert!(matches!(result, Err(Error::PayloadTooLarge(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_json_body_rejected() {
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "application/json")
			.body("{}")
			.build()
			.unwrap();

		let result = request.form().await;

		assert!(matches!(result, Err(Error::BadRequest(_))));
	}

	#[rstest]
	#[case("3.50", true)]
	#[case("abc", false)]
	fn test_parse_field(#[case] raw: &str, #[case] ok: bool) {
		let form = FormData::new().with_field("price", raw);

		assert_eq!(form.parse::<f64>("price").is_ok(), ok);
	}
}
