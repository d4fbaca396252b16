//! In-process storage backend

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::validate_object_path;
use crate::{MediaStorage, Result, StorageError, UploadOutcome};

const MEMORY_BASE_URL: &str = "memory://media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
	pub bucket: String,
	pub name: String,
	pub content: Vec<u8>,
	pub content_type: String,
}

/// Keeps uploads in a shared map. Clones see the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
	objects: Arc<Mutex<HashMap<(String, String), StoredObject>>>,
	fail_with: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make every later upload and connection check fail with `reason`.
	/// `None` restores normal behaviour.
	pub fn set_failure(&self, reason: Option<&str>) {
		*self.fail_with.lock() = reason.map(str::to_string);
	}

	pub fn get(&self, bucket: &str, name: &str) -> Option<StoredObject> {
		self.objects
			.lock()
			.get(&(bucket.to_string(), name.to_string()))
			.cloned()
	}

	pub fn objects(&self) -> Vec<StoredObject> {
		self.objects.lock().values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.objects.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl MediaStorage for MemoryStorage {
	async fn upload(
		&self,
		bucket: &str,
		name: &str,
		content: &[u8],
		content_type: &str,
	) -> UploadOutcome {
		if let Some(reason) = self.fail_with.lock().clone() {
			return UploadOutcome::Failed { reason };
		}
		if let Err(e) = validate_object_path(bucket, name) {
			return UploadOutcome::failed(e.to_string());
		}

		self.objects.lock().insert(
			(bucket.to_string(), name.to_string()),
			StoredObject {
				bucket: bucket.to_string(),
				name: name.to_string(),
				content: content.to_vec(),
				content_type: content_type.to_string(),
			},
		);
		UploadOutcome::Uploaded {
			url: format!("{}/{}/{}", MEMORY_BASE_URL, bucket, name),
		}
	}

	async fn check_connection(&self) -> Result<()> {
		match self.fail_with.lock().clone() {
			Some(reason) => Err(StorageError::NetworkError(reason)),
			None => Ok(()),
		}
	}

	fn name(&self) -> &'static str {
		"memory"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_upload_records_object() {
		// Arrange
		let storage = MemoryStorage::new();

		// Act
		let outcome = storage
			.upload("marketplace", "cd34_lamp.png", b"png", "image/png")
			.await;

		// Assert
		assert_eq!(
			outcome.url(),
			Some("memory://media/marketplace/cd34_lamp.png")
		);
		let stored = storage.get("marketplace", "cd34_lamp.png").unwrap();
		assert_eq!(stored.content_type, "image/png");
		assert_eq!(storage.len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failure_mode() {
		// Arrange
		let storage = MemoryStorage::new();
		storage.set_failure(Some("Bucket not found"));

		// Act
		let outcome = storage.upload("lostfound", "a.png", b"x", "image/png").await;

		// Assert
		assert_eq!(outcome, UploadOutcome::failed("Bucket not found"));
		assert!(storage.is_empty());
		assert!(storage.check_connection().await.is_err());
	}
}
