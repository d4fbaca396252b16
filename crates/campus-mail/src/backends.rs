//! Email delivery backends

use crate::{EmailError, EmailMessage, EmailResult};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait EmailBackend: Send + Sync {
	/// Deliver `messages`, returning how many were sent. Stops at the
	/// first failure.
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize>;
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
	/// Plain connection, for local relays only.
	None,
	/// Upgrade with STARTTLS (usually port 587).
	#[default]
	StartTls,
	/// TLS from the first byte (usually port 465).
	Tls,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	pub security: SmtpSecurity,
	pub timeout: Duration,
	/// Sender used when a message has none.
	pub default_from: String,
}

impl SmtpConfig {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			username: None,
			password: None,
			security: SmtpSecurity::default(),
			timeout: Duration::from_secs(30),
			default_from: String::new(),
		}
	}

	pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());
		self
	}

	pub fn with_security(mut self, security: SmtpSecurity) -> Self {
		self.security = security;
		self
	}

	pub fn with_default_from(mut self, from: impl Into<String>) -> Self {
		self.default_from = from.into();
		self
	}
}

pub struct SmtpBackend {
	config: SmtpConfig,
	transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpBackend {
	/// Build the transport. No connection is opened until the first send.
	pub fn new(config: SmtpConfig) -> EmailResult<Self> {
		let builder = match config.security {
			SmtpSecurity::None => {
				AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
			}
			SmtpSecurity::StartTls => {
				AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
					.map_err(|e| EmailError::SmtpError(e.to_string()))?
			}
			SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
				.map_err(|e| EmailError::SmtpError(e.to_string()))?,
		};

		let mut builder = builder.port(config.port).timeout(Some(config.timeout));
		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		Ok(Self {
			transport: builder.build(),
			config,
		})
	}

	fn to_lettre(&self, message: &EmailMessage) -> EmailResult<lettre::Message> {
		let from = if message.from_email().is_empty() {
			self.config.default_from.as_str()
		} else {
			message.from_email()
		};
		let from: Mailbox = from
			.parse()
			.map_err(|_| EmailError::InvalidAddress(from.to_string()))?;

		let mut builder = lettre::Message::builder()
			.from(from)
			.subject(message.subject())
			.header(ContentType::TEXT_PLAIN);
		for to in message.to() {
			let mailbox: Mailbox = to
				.parse()
				.map_err(|_| EmailError::InvalidAddress(to.clone()))?;
			builder = builder.to(mailbox);
		}

		builder
			.body(message.body().to_string())
			.map_err(|e| EmailError::BackendError(e.to_string()))
	}
}

#[async_trait]
impl EmailBackend for SmtpBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		let mut sent = 0;
		for message in messages {
			let email = self.to_lettre(message)?;
			self.transport
				.send(email)
				.await
				.map_err(|e| EmailError::SmtpError(e.to_string()))?;
			sent += 1;
		}
		tracing::info!(host = %self.config.host, sent, "emails delivered");
		Ok(sent)
	}
}

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct ConsoleBackend;

#[async_trait]
impl EmailBackend for ConsoleBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		for message in messages {
			tracing::info!(
				to = ?message.to(),
				subject = %message.subject(),
				body = %message.body(),
				"email (console backend)"
			);
		}
		Ok(messages.len())
	}
}

/// Keeps sent messages in memory. Clones share the outbox.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
	outbox: Arc<Mutex<Vec<EmailMessage>>>,
	fail_with: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make every later send fail with `reason`, or succeed again with `None`.
	pub fn set_failure(&self, reason: Option<&str>) {
		*self.fail_with.lock() = reason.map(str::to_string);
	}

	pub fn messages(&self) -> Vec<EmailMessage> {
		self.outbox.lock().clone()
	}

	pub fn count(&self) -> usize {
		self.outbox.lock().len()
	}

	pub fn clear(&self) {
		self.outbox.lock().clear();
	}
}

#[async_trait]
impl EmailBackend for MemoryBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		if let Some(reason) = self.fail_with.lock().clone() {
			return Err(EmailError::BackendError(reason));
		}
		self.outbox.lock().extend_from_slice(messages);
		Ok(messages.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn message() -> EmailMessage {
		EmailMessage::builder()
			.from("noreply@campus.example")
			.to(vec!["s@campus.example".to_string()])
			.subject("Confirm Your Email")
			.body("link")
			.build()
			.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_memory_backend_records() {
		let backend = MemoryBackend::new();

		let sent = backend.send_messages(&[message(), message()]).await.unwrap();

		assert_eq!(sent, 2);
		assert_eq!(backend.messages()[0].subject(), "Confirm Your Email");
	}

	#[rstest]
	#[tokio::test]
	async fn test_memory_backend_failure_mode() {
		// Arrange
		let backend = MemoryBackend::new();
		backend.set_failure(Some("connection refused"));

		// Act
		let result = backend.send_messages(&[message()]).await;

		// Assert
		assert!(matches!(result, Err(EmailError::BackendError(_))));
		assert_eq!(backend.count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_console_backend_counts() {
		let sent = ConsoleBackend.send_messages(&[message()]).await.unwrap();

		assert_eq!(sent, 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_smtp_message_conversion_uses_default_from() {
		// Arrange
		let backend = SmtpBackend::new(
			SmtpConfig::new("localhost", 2525)
				.with_security(SmtpSecurity::None)
				.with_default_from("support@campus.example"),
		)
		.unwrap();
		let message = EmailMessage::builder()
			.to(vec!["s@campus.example".to_string()])
			.subject("Hi")
			.body("text")
			.build()
			.unwrap();

		// Act
		let email = backend.to_lettre(&message).unwrap();

		// Assert
		let raw = String::from_utf8(email.formatted()).unwrap();
		assert!(raw.contains("From: support@campus.example"));
		assert!(raw.contains("To: s@campus.example"));
	}
}
