//! Storage error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Configuration error: {0}")]
	ConfigError(String),

	#[error("Invalid object name: {0}")]
	InvalidName(String),

	#[error("Network error: {0}")]
	NetworkError(String),

	/// The provider answered, but with an error.
	#[error("Provider error: {0}")]
	ProviderError(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
