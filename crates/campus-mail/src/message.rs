use crate::{EmailError, EmailResult};
use lettre::Address;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
	subject: String,
	body: String,
	from_email: String,
	to: Vec<String>,
}

impl EmailMessage {
	pub fn builder() -> EmailMessageBuilder {
		EmailMessageBuilder::default()
	}

	pub fn subject(&self) -> &str {
		&self.subject
	}

	pub fn body(&self) -> &str {
		&self.body
	}

	pub fn from_email(&self) -> &str {
		&self.from_email
	}

	pub fn to(&self) -> &[String] {
		&self.to
	}
}

#[derive(Debug, Default)]
pub struct EmailMessageBuilder {
	subject: String,
	body: String,
	from_email: String,
	to: Vec<String>,
}

impl EmailMessageBuilder {
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = body.into();
		self
	}

	pub fn from(mut self, from: impl Into<String>) -> Self {
		self.from_email = from.into();
		self
	}

	pub fn to(mut self, to: Vec<String>) -> Self {
		self.to = to;
		self
	}

	/// Validate addresses and the subject line.
	pub fn build(self) -> EmailResult<EmailMessage> {
		if self.to.is_empty() {
			return Err(EmailError::MissingField("to".to_string()));
		}
		if !self.from_email.is_empty() {
			validate_email(&self.from_email)?;
		}
		for address in &self.to {
			validate_email(address)?;
		}
		if self.subject.contains(['\r', '\n']) {
			return Err(EmailError::HeaderInjection(self.subject));
		}

		Ok(EmailMessage {
			subject: self.subject,
			body: self.body,
			from_email: self.from_email,
			to: self.to,
		})
	}
}

fn validate_email(address: &str) -> EmailResult<()> {
	address
		.parse::<Address>()
		.map(|_| ())
		.map_err(|_| EmailError::InvalidAddress(address.to_string()))
}
