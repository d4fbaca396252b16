//! Error taxonomy shared by every layer of the application.
//!
//! Each variant maps onto one HTTP status code through
//! [`Error::status_code`]. Server-side failures (database, delegates,
//! internal bugs) are reported to clients without their details.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Malformed user input: bad contact number, password mismatch, bad file.
	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Bad request: {0}")]
	BadRequest(String),

	#[error("Payload too large: {0}")]
	PayloadTooLarge(String),

	/// No identity, or the identity could not be verified.
	#[error("Authentication error: {0}")]
	Authentication(String),

	/// The identity is known but may not perform the operation.
	#[error("Authorization error: {0}")]
	Authorization(String),

	/// Missing or soft-deleted resource.
	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Method not allowed: {0}")]
	MethodNotAllowed(String),

	#[error("Database error: {0}")]
	Database(String),

	/// Failure of an external collaborator such as mail or object storage.
	#[error("External service error: {0}")]
	External(String),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Internal server error: {0}")]
	Internal(String),
}

impl Error {
	/// HTTP status code for this error.
	///
	/// # Examples
	///
	/// ```
	/// use campus_core::Error;
	///
	/// assert_eq!(Error::NotFound("item 3".into()).status_code(), 404);
	/// assert_eq!(Error::Database("locked".into()).status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::Validation(_) | Error::BadRequest(_) => 400,
			Error::Authentication(_) => 401,
			Error::Authorization(_) => 403,
			Error::NotFound(_) => 404,
			Error::MethodNotAllowed(_) => 405,
			Error::PayloadTooLarge(_) => 413,
			Error::External(_) => 502,
			Error::Database(_) | Error::Serialization(_) | Error::Internal(_) => 500,
		}
	}

	/// Whether the failure is on the server side and must not be shown verbatim.
	pub fn is_server_error(&self) -> bool {
		self.status_code() >= 500
	}

	/// Message safe to return to a client.
	///
	/// Client errors keep their detail; server errors collapse into a
	/// generic description.
	pub fn public_message(&self) -> String {
		match self {
			Error::Database(_) | Error::Serialization(_) | Error::Internal(_) => {
				"Internal server error".to_string()
			}
			Error::External(_) => "Upstream service unavailable".to_string(),
			Error::Validation(msg)
			| Error::BadRequest(msg)
			| Error::PayloadTooLarge(msg)
			| Error::Authentication(msg)
			| Error::Authorization(msg)
			| Error::NotFound(msg)
			| Error::MethodNotAllowed(msg) => msg.clone(),
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::RowNotFound => Error::NotFound("Row not found".to_string()),
			other => Error::Database(other.to_string()),
		}
	}
}
