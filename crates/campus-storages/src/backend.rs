//! Media storage trait definition.

use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Result of handing a file to a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
	/// Stored; `url` is publicly readable.
	Uploaded { url: String },
	/// Rejected or unreachable; `reason` is safe to show to the uploader.
	Failed { reason: String },
}

impl UploadOutcome {
	pub fn failed(reason: impl Into<String>) -> Self {
		UploadOutcome::Failed {
			reason: reason.into(),
		}
	}

	pub fn url(&self) -> Option<&str> {
		match self {
			UploadOutcome::Uploaded { url } => Some(url),
			UploadOutcome::Failed { .. } => None,
		}
	}
}

/// Object storage for uploaded media.
///
/// # Examples
///
/// ```rust,no_run
/// use campus_storages::{MediaStorage, UploadOutcome};
///
/// async fn store(storage: &dyn MediaStorage, bytes: &[u8]) -> Option<String> {
///     match storage.upload("marketplace", "a1b2_lamp.png", bytes, "image/png").await {
///         UploadOutcome::Uploaded { url } => Some(url),
///         UploadOutcome::Failed { reason } => {
///             eprintln!("upload failed: {}", reason);
///             None
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait MediaStorage: Send + Sync {
	/// Store `content` as `name` inside `bucket`.
	///
	/// Never returns an error: transport and provider failures are folded
	/// into [`UploadOutcome::Failed`].
	async fn upload(
		&self,
		bucket: &str,
		name: &str,
		content: &[u8],
		content_type: &str,
	) -> UploadOutcome;

	/// Check that the backend is reachable and usable.
	async fn check_connection(&self) -> Result<()>;

	/// Short backend name for logs.
	fn name(&self) -> &'static str;
}

/// Object name for an upload: a random hex prefix joined to the
/// (already sanitized) filename with `_`.
pub fn unique_object_name(filename: &str) -> String {
	format!("{}_{}", uuid::Uuid::new_v4().simple(), filename)
}

/// MIME type guessed from the filename, `application/octet-stream` when unknown.
pub fn guess_content_type(filename: &str) -> String {
	mime_guess::from_path(filename)
		.first_or_octet_stream()
		.essence_str()
		.to_string()
}

/// Reject names that could escape a bucket.
pub(crate) fn validate_object_path(bucket: &str, name: &str) -> Result<()> {
	for part in [bucket, name] {
		if part.is_empty() || part.contains(['/', '\\']) || part == "." || part == ".." {
			return Err(crate::StorageError::InvalidName(part.to_string()));
		}
	}
	Ok(())
}
