//! Typed application settings

use crate::builder::{SettingsBuilder, SettingsError};
use crate::profile::Profile;
use crate::sources::{DefaultSource, EnvSource, TomlFileSource};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

pub const ENV_PREFIX: &str = "CAMPUS_";

/// Used outside production when no secret key is configured.
const DEVELOPMENT_SECRET_KEY: &str = "campus-hub-insecure-development-key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	pub log_level: String,
	pub server: ServerSettings,
	pub database: DatabaseSettings,
	pub security: SecuritySettings,
	pub session: SessionSettings,
	pub email: EmailSettings,
	pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
	pub addr: String,
	/// Absolute site URL used in links sent by email.
	pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
	pub url: String,
	pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySettings {
	pub secret_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
	File,
	Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
	pub backend: SessionBackendKind,
	pub dir: String,
	pub cookie_secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackendKind {
	Smtp,
	Console,
	Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
	pub backend: EmailBackendKind,
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	/// STARTTLS
	pub use_tls: bool,
	/// Implicit TLS
	pub use_ssl: bool,
	pub from_email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
	Supabase,
	Local,
	Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
	pub backend: StorageBackendKind,
	pub supabase_url: String,
	pub supabase_key: String,
	pub lostfound_bucket: String,
	pub marketplace_bucket: String,
	pub local_dir: String,
	pub local_base_url: String,
}

/// Built-in defaults, the lowest settings layer.
pub fn default_values() -> Value {
	json!({
		"log_level": "info",
		"server": {
			"addr": "127.0.0.1:8000",
			"base_url": "http://localhost:8000",
		},
		"database": {
			"url": "sqlite://campus_hub.db?mode=rwc",
			"max_connections": 5,
		},
		"security": {
			"secret_key": "",
		},
		"session": {
			"backend": "file",
			"dir": "/tmp/campus_hub_session",
			"cookie_secure": false,
		},
		"email": {
			"backend": "console",
			"host": "smtp.gmail.com",
			"port": 587,
			"username": "",
			"password": "",
			"use_tls": true,
			"use_ssl": false,
			"from_email": "noreply@campus-hub.local",
		},
		"storage": {
			"backend": "local",
			"supabase_url": "",
			"supabase_key": "",
			"lostfound_bucket": "lostfound",
			"marketplace_bucket": "marketplace",
			"local_dir": "media",
			"local_base_url": "http://localhost:8000/media",
		},
	})
}

impl Settings {
	/// Load settings for the profile named by `CAMPUS_ENV`, reading TOML
	/// files from `settings_dir`.
	pub fn load(settings_dir: impl AsRef<Path>) -> Result<Self, SettingsError> {
		Self::load_for(Profile::from_env(), settings_dir)
	}

	pub fn load_for(profile: Profile, settings_dir: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let settings_dir = settings_dir.as_ref();

		let merged = SettingsBuilder::new()
			.profile(profile.clone())
			.add_source(DefaultSource::from_value(default_values()))
			.add_source(TomlFileSource::new(settings_dir.join("base.toml")))
			.add_source(TomlFileSource::new(
				settings_dir.join(profile.settings_file_name()),
			))
			.add_source(EnvSource::new().with_prefix(ENV_PREFIX))
			.build()?;

		let settings: Settings = merged.into_typed()?;
		settings.finalize(&profile)
	}

	/// Settings from the built-in defaults alone, without validation.
	pub fn defaults() -> Result<Self, SettingsError> {
		Ok(serde_json::from_value(default_values())?)
	}

	/// Check cross-field rules and fill the development secret key.
	pub fn finalize(mut self, profile: &Profile) -> Result<Self, SettingsError> {
		if self.security.secret_key.is_empty() {
			if profile.is_production() {
				return Err(SettingsError::ImproperlyConfigured(
					"security.secret_key must be set in production".to_string(),
				));
			}
			tracing::warn!(profile = %profile, "no secret key configured; using the development key");
			self.security.secret_key = DEVELOPMENT_SECRET_KEY.to_string();
		}

		if self.email.use_tls && self.email.use_ssl {
			return Err(SettingsError::ImproperlyConfigured(
				"email.use_tls and email.use_ssl are mutually exclusive".to_string(),
			));
		}

		if self.storage.backend == StorageBackendKind::Supabase
			&& (self.storage.supabase_url.is_empty() || self.storage.supabase_key.is_empty())
		{
			return Err(SettingsError::ImproperlyConfigured(
				"storage.supabase_url and storage.supabase_key are required for the supabase backend"
					.to_string(),
			));
		}

		Ok(self)
	}
}
