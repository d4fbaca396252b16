//! Local file system storage backend implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::backend::validate_object_path;
use crate::config::LocalConfig;
use crate::{MediaStorage, Result, StorageError, UploadOutcome};

/// Stores objects as `<base_path>/<bucket>/<name>`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
	base_path: PathBuf,
	base_url: String,
}

impl LocalStorage {
	/// Create a new local storage backend.
	///
	/// # Errors
	///
	/// Returns `StorageError::ConfigError` if the base path is missing or
	/// not a directory.
	pub fn new(config: LocalConfig) -> Result<Self> {
		let base_path = PathBuf::from(config.base_path);

		if !base_path.exists() {
			return Err(StorageError::ConfigError(format!(
				"Base path does not exist: {}",
				base_path.display()
			)));
		}

		if !base_path.is_dir() {
			return Err(StorageError::ConfigError(format!(
				"Base path is not a directory: {}",
				base_path.display()
			)));
		}

		Ok(Self {
			base_path,
			base_url: config.base_url.trim_end_matches('/').to_string(),
		})
	}

	fn get_path(&self, bucket: &str, name: &str) -> PathBuf {
		self.base_path.join(bucket).join(name)
	}

	fn public_url(&self, bucket: &str, name: &str) -> String {
		format!("{}/{}/{}", self.base_url, bucket, name)
	}

	async fn write(&self, bucket: &str, name: &str, content: &[u8]) -> Result<()> {
		validate_object_path(bucket, name)?;
		let path = self.get_path(bucket, name);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}
		if fs::try_exists(&path).await? {
			return Err(StorageError::ProviderError(
				"The resource already exists".to_string(),
			));
		}

		fs::write(&path, content).await?;
		Ok(())
	}
}

#[async_trait]
impl MediaStorage for LocalStorage {
	async fn upload(
		&self,
		bucket: &str,
		name: &str,
		content: &[u8],
		_content_type: &str,
	) -> UploadOutcome {
		match self.write(bucket, name, content).await {
			Ok(()) => UploadOutcome::Uploaded {
				url: self.public_url(bucket, name),
			},
			Err(e) => {
				tracing::warn!(bucket, name, error = %e, "local upload failed");
				UploadOutcome::failed(e.to_string())
			}
		}
	}

	async fn check_connection(&self) -> Result<()> {
		let metadata = fs::metadata(&self.base_path).await?;
		if metadata.is_dir() {
			Ok(())
		} else {
			Err(StorageError::ConfigError(format!(
				"Base path is not a directory: {}",
				self.base_path.display()
			)))
		}
	}

	fn name(&self) -> &'static str {
		"local"
	}
}
