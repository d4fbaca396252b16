//! Supabase Storage backend
//!
//! Talks to the Storage REST API directly:
//!
//! - upload: `POST {url}/storage/v1/object/{bucket}/{name}`
//! - public URL: `{url}/storage/v1/object/public/{bucket}/{name}`
//! - connectivity: `GET {url}/storage/v1/bucket`
//!
//! Every non-success answer is reduced to a single reason string taken from
//! the JSON error body (`message`, then `error`), or the HTTP status when the
//! body is not JSON.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::backend::validate_object_path;
use crate::config::SupabaseConfig;
use crate::{MediaStorage, Result, StorageError, UploadOutcome};

pub struct SupabaseStorage {
	config: SupabaseConfig,
	client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
	#[serde(rename = "Key")]
	key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
	message: Option<String>,
	error: Option<String>,
}

impl SupabaseStorage {
	pub fn new(config: SupabaseConfig) -> Result<Self> {
		if config.url.is_empty() {
			return Err(StorageError::ConfigError(
				"Supabase URL is not configured".to_string(),
			));
		}

		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.build()
			.map_err(|e| StorageError::ConfigError(format!("Failed to create client: {}", e)))?;

		Ok(Self { config, client })
	}

	fn base_url(&self) -> &str {
		self.config.url.trim_end_matches('/')
	}

	fn object_url(&self, bucket: &str, name: &str) -> String {
		format!("{}/storage/v1/object/{}/{}", self.base_url(), bucket, name)
	}

	/// Public URL of an object in a public bucket.
	pub fn public_url(&self, bucket: &str, path: &str) -> String {
		format!(
			"{}/storage/v1/object/public/{}/{}",
			self.base_url(),
			bucket,
			path
		)
	}

	async fn send_upload(
		&self,
		bucket: &str,
		name: &str,
		content: &[u8],
		content_type: &str,
	) -> Result<String> {
		validate_object_path(bucket, name)?;

		let response = self
			.client
			.post(self.object_url(bucket, name))
			.bearer_auth(&self.config.key)
			.header("apikey", &self.config.key)
			.header(reqwest::header::CONTENT_TYPE, content_type)
			.header("x-upsert", "false")
			.body(content.to_vec())
			.send()
			.await
			.map_err(|e| StorageError::NetworkError(format!("Request failed: {}", e)))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| StorageError::NetworkError(format!("Failed to read response: {}", e)))?;

		if !status.is_success() {
			return Err(StorageError::ProviderError(error_reason(status, &body)));
		}

		Ok(uploaded_path(bucket, name, &body))
	}
}

/// Object path inside the bucket, from the `Key` of a success body.
fn uploaded_path(bucket: &str, name: &str, body: &str) -> String {
	serde_json::from_str::<UploadResponse>(body)
		.ok()
		.and_then(|r| r.key)
		.map(|key| {
			key.strip_prefix(&format!("{}/", bucket))
				.unwrap_or(&key)
				.to_string()
		})
		.unwrap_or_else(|| name.to_string())
}

fn error_reason(status: reqwest::StatusCode, body: &str) -> String {
	serde_json::from_str::<ErrorResponse>(body)
		.ok()
		.and_then(|e| e.message.or(e.error))
		.filter(|reason| !reason.is_empty())
		.unwrap_or_else(|| format!("HTTP {}", status))
}

#[async_trait]
impl MediaStorage for SupabaseStorage {
	async fn upload(
		&self,
		bucket: &str,
		name: &str,
		content: &[u8],
		content_type: &str,
	) -> UploadOutcome {
		match self.send_upload(bucket, name, content, content_type).await {
			Ok(path) => {
				tracing::info!(bucket, path = %path, size = content.len(), "image uploaded");
				UploadOutcome::Uploaded {
					url: self.public_url(bucket, &path),
				}
			}
			Err(e) => {
				tracing::warn!(bucket, name, error = %e, "supabase upload failed");
				let reason = match e {
					StorageError::ProviderError(reason) | StorageError::NetworkError(reason) => {
						reason
					}
					other => other.to_string(),
				};
				UploadOutcome::Failed { reason }
			}
		}
	}

	async fn check_connection(&self) -> Result<()> {
		let response = self
			.client
			.get(format!("{}/storage/v1/bucket", self.base_url()))
			.bearer_auth(&self.config.key)
			.header("apikey", &self.config.key)
			.send()
			.await
			.map_err(|e| StorageError::NetworkError(format!("Request failed: {}", e)))?;

		let status = response.status();
		let body = response.text().await.unwrap_or_default();
		if !status.is_success() {
			return Err(StorageError::ProviderError(error_reason(status, &body)));
		}

		match serde_json::from_str::<serde_json::Value>(&body) {
			Ok(serde_json::Value::Array(_)) => Ok(()),
			_ => Err(StorageError::ProviderError(
				"Unexpected bucket listing response".to_string(),
			)),
		}
	}

	fn name(&self) -> &'static str {
		"supabase"
	}
}
