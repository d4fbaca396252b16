//! Configuration types for storage backends.

use crate::{Result, StorageError};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
	Supabase,
	Local,
	Memory,
}

impl std::fmt::Display for BackendType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			BackendType::Supabase => write!(f, "supabase"),
			BackendType::Local => write!(f, "local"),
			BackendType::Memory => write!(f, "memory"),
		}
	}
}

impl FromStr for BackendType {
	type Err = StorageError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"supabase" => Ok(BackendType::Supabase),
			"local" => Ok(BackendType::Local),
			"memory" => Ok(BackendType::Memory),
			_ => Err(StorageError::ConfigError(format!(
				"Invalid backend type: {}",
				s
			))),
		}
	}
}

/// Supabase Storage project settings.
#[cfg(feature = "supabase")]
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
	/// Project URL, e.g. `https://abc.supabase.co`
	pub url: String,
	/// Service role or anon key
	pub key: String,
	/// Per request timeout in seconds
	pub timeout_secs: u64,
}

#[cfg(feature = "supabase")]
impl SupabaseConfig {
	pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			key: key.into(),
			timeout_secs: 30,
		}
	}
}

#[derive(Debug, Clone)]
pub struct LocalConfig {
	/// Directory holding one subdirectory per bucket
	pub base_path: String,
	/// URL prefix the directory is served under
	pub base_url: String,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
	#[cfg(feature = "supabase")]
	Supabase(SupabaseConfig),
	Local(LocalConfig),
	Memory,
}

impl StorageConfig {
	pub fn backend_type(&self) -> BackendType {
		match self {
			#[cfg(feature = "supabase")]
			StorageConfig::Supabase(_) => BackendType::Supabase,
			StorageConfig::Local(_) => BackendType::Local,
			StorageConfig::Memory => BackendType::Memory,
		}
	}
}
