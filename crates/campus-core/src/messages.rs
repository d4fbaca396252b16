//! Flash messages
//!
//! A message is queued while handling one request and displayed on the
//! next page the client loads, typically right after a redirect.

use serde::{Deserialize, Serialize};

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	Debug,
	Info,
	Success,
	Warning,
	Error,
}

impl Level {
	/// CSS-style tag used by the presentation layer.
	pub fn tag(&self) -> &'static str {
		match self {
			Level::Debug => "debug",
			Level::Info => "info",
			Level::Success => "success",
			Level::Warning => "warning",
			Level::Error => "danger",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub level: Level,
	pub text: String,
}

impl Message {
	pub fn new(level: Level, text: impl Into<String>) -> Self {
		Self {
			level,
			text: text.into(),
		}
	}

	pub fn debug(text: impl Into<String>) -> Self {
		Self::new(Level::Debug, text)
	}

	pub fn info(text: impl Into<String>) -> Self {
		Self::new(Level::Info, text)
	}

	pub fn success(text: impl Into<String>) -> Self {
		Self::new(Level::Success, text)
	}

	pub fn warning(text: impl Into<String>) -> Self {
		Self::new(Level::Warning, text)
	}

	pub fn error(text: impl Into<String>) -> Self {
		Self::new(Level::Error, text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Message::debug("m"), Level::Debug, "debug")]
	#[case(Message::info("m"), Level::Info, "info")]
	#[case(Message::success("m"), Level::Success, "success")]
	#[case(Message::warning("m"), Level::Warning, "warning")]
	#[case(Message::error("m"), Level::Error, "danger")]
	fn test_constructors_set_level(
		#[case] message: Message,
		#[case] level: Level,
		#[case] tag: &str,
	) {
		assert_eq!(message.level, level);
		assert_eq!(message.level.tag(), tag);
		assert_eq!(message.text, "m");
	}

	#[rstest]
	fn test_message_serializes_level_lowercase() {
		// Arrange
		let message = Message::warning("Rate-limited. Wait a minute.");

		// Act
		let json = serde_json::to_value(&message).unwrap();

		// Assert
		assert_eq!(json["level"], "warning");
		assert_eq!(json["text"], "Rate-limited. Wait a minute.");
	}
}
