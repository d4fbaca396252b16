//! # campus-mail
//!
//! Outbound email. Build an [`EmailMessage`] and hand it to an
//! [`EmailBackend`]:
//!
//! - [`SmtpBackend`] delivers through an SMTP relay with `lettre`
//! - [`ConsoleBackend`] logs the message instead of sending it
//! - [`MemoryBackend`] keeps messages in memory for tests
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> Result<(), campus_mail::EmailError> {
//! use campus_mail::{EmailBackend, EmailMessage, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//! let email = EmailMessage::builder()
//!     .from("noreply@campus.example")
//!     .to(vec!["student@campus.example".to_string()])
//!     .subject("Confirm Your Email")
//!     .body("Please click the link to confirm your email: https://campus.example/auth/confirm/abc")
//!     .build()?;
//!
//! backend.send_messages(&[email]).await?;
//! assert_eq!(backend.count(), 1);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod backends;
pub mod message;

pub use backends::{ConsoleBackend, EmailBackend, MemoryBackend, SmtpBackend, SmtpConfig, SmtpSecurity};
pub use message::{EmailMessage, EmailMessageBuilder};

#[derive(Debug, Error)]
pub enum EmailError {
	#[error("Invalid email address: {0}")]
	InvalidAddress(String),

	#[error("Missing required field: {0}")]
	MissingField(String),

	#[error("Backend error: {0}")]
	BackendError(String),

	#[error("SMTP error: {0}")]
	SmtpError(String),

	#[error("Header injection attempt detected: {0}")]
	HeaderInjection(String),
}

pub type EmailResult<T> = std::result::Result<T, EmailError>;
