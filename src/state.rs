//! Shared application state
//!
//! One [`AppState`] is built at startup and handed to every handler behind
//! an `Arc`. It owns the database pool and the delegates: session store,
//! media storage, mail backend, token signer, password hasher and clock.

use crate::apps::items::ItemKind;
use crate::db;
use campus_auth::{
	Argon2Hasher, FileSessionStore, InMemorySessionStore, PasswordHasher, SessionError, SessionStore,
	SystemTimeProvider, TimeProvider, TimestampSigner,
};
use campus_conf::{
	EmailBackendKind, EmailSettings, SessionBackendKind, SessionSettings, Settings, StorageBackendKind,
	StorageSettings,
};
use campus_mail::{
	ConsoleBackend, EmailBackend, EmailError, MemoryBackend, SmtpBackend, SmtpConfig, SmtpSecurity,
};
use campus_storages::config::{LocalConfig, SupabaseConfig};
use campus_storages::{MediaStorage, StorageConfig, StorageError, create_storage};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Salt namespacing email confirmation tokens.
pub const EMAIL_CONFIRM_SALT: &str = "email-confirm";

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("Migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),

	#[error("Session store error: {0}")]
	Session(#[from] SessionError),

	#[error("Media storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("Mail backend error: {0}")]
	Email(#[from] EmailError),
}

pub struct AppState {
	pub pool: SqlitePool,
	pub settings: Settings,
	pub sessions: Arc<dyn SessionStore>,
	pub media: Arc<dyn MediaStorage>,
	pub mailer: Arc<dyn EmailBackend>,
	/// Signs email confirmation tokens.
	pub signer: TimestampSigner,
	pub hasher: Arc<dyn PasswordHasher>,
	pub clock: Arc<dyn TimeProvider>,
}

impl AppState {
	/// Connect to the configured database and build every delegate from
	/// `settings`.
	pub async fn from_settings(settings: Settings) -> Result<Self, StartupError> {
		let pool = db::connect(&settings.database).await?;
		Self::builder(settings, pool).build().await
	}

	pub fn builder(settings: Settings, pool: SqlitePool) -> AppStateBuilder {
		AppStateBuilder {
			settings,
			pool,
			sessions: None,
			media: None,
			mailer: None,
			hasher: None,
			clock: None,
		}
	}

	pub fn now(&self) -> DateTime<Utc> {
		self.clock.now()
	}

	/// Storage bucket holding images of `kind`.
	pub fn bucket(&self, kind: ItemKind) -> &str {
		match kind {
			ItemKind::LostFound => &self.settings.storage.lostfound_bucket,
			ItemKind::Marketplace => &self.settings.storage.marketplace_bucket,
		}
	}

	/// Absolute URL for a site path, used in emailed links.
	pub fn absolute_url(&self, path: &str) -> String {
		format!("{}{}", self.settings.server.base_url.trim_end_matches('/'), path)
	}
}

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState")
			.field("media", &self.media.name())
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}

/// Builds an [`AppState`], taking delegates from settings unless one is
/// supplied explicitly.
pub struct AppStateBuilder {
	settings: Settings,
	pool: SqlitePool,
	sessions: Option<Arc<dyn SessionStore>>,
	media: Option<Arc<dyn MediaStorage>>,
	mailer: Option<Arc<dyn EmailBackend>>,
	hasher: Option<Arc<dyn PasswordHasher>>,
	clock: Option<Arc<dyn TimeProvider>>,
}

impl AppStateBuilder {
	pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
		self.sessions = Some(sessions);
		self
	}

	pub fn media(mut self, media: Arc<dyn MediaStorage>) -> Self {
		self.media = Some(media);
		self
	}

	pub fn mailer(mut self, mailer: Arc<dyn EmailBackend>) -> Self {
		self.mailer = Some(mailer);
		self
	}

	pub fn hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
		self.hasher = Some(hasher);
		self
	}

	pub fn clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
		self.clock = Some(clock);
		self
	}

	pub async fn build(self) -> Result<AppState, StartupError> {
		let sessions = match self.sessions {
			Some(sessions) => sessions,
			None => session_store(&self.settings.session).await?,
		};
		let media = match self.media {
			Some(media) => media,
			None => media_storage(&self.settings.storage).await?,
		};
		let mailer = match self.mailer {
			Some(mailer) => mailer,
			None => email_backend(&self.settings.email)?,
		};
		let hasher = self.hasher.unwrap_or_else(|| Arc::new(Argon2Hasher::new()));
		let clock = self
			.clock
			.unwrap_or_else(|| Arc::new(SystemTimeProvider::new()));
		let signer = TimestampSigner::new(
			self.settings.security.secret_key.as_bytes(),
			EMAIL_CONFIRM_SALT,
			clock.clone(),
		);

		tracing::info!(media = media.name(), "application state ready");
		Ok(AppState {
			pool: self.pool,
			settings: self.settings,
			sessions,
			media,
			mailer,
			signer,
			hasher,
			clock,
		})
	}
}

pub async fn session_store(settings: &SessionSettings) -> Result<Arc<dyn SessionStore>, SessionError> {
	Ok(match settings.backend {
		SessionBackendKind::File => Arc::new(FileSessionStore::new(&settings.dir).await?),
		SessionBackendKind::Memory => Arc::new(InMemorySessionStore::new()),
	})
}

pub async fn media_storage(settings: &StorageSettings) -> Result<Arc<dyn MediaStorage>, StorageError> {
	let config = match settings.backend {
		StorageBackendKind::Supabase => StorageConfig::Supabase(SupabaseConfig::new(
			settings.supabase_url.clone(),
			settings.supabase_key.clone(),
		)),
		StorageBackendKind::Local => StorageConfig::Local(LocalConfig {
			base_path: settings.local_dir.clone(),
			base_url: settings.local_base_url.clone(),
		}),
		StorageBackendKind::Memory => StorageConfig::Memory,
	};
	create_storage(config).await
}

pub fn email_backend(settings: &EmailSettings) -> Result<Arc<dyn EmailBackend>, EmailError> {
	Ok(match settings.backend {
		EmailBackendKind::Smtp => {
			let security = if settings.use_ssl {
				SmtpSecurity::Tls
			} else if settings.use_tls {
				SmtpSecurity::StartTls
			} else {
				SmtpSecurity::None
			};
			let mut config = SmtpConfig::new(settings.host.clone(), settings.port)
				.with_security(security)
				.with_default_from(settings.from_email.clone());
			if !settings.username.is_empty() {
				config = config.with_credentials(settings.username.clone(), settings.password.clone());
			}
			Arc::new(SmtpBackend::new(config)?)
		}
		EmailBackendKind::Console => Arc::new(ConsoleBackend),
		EmailBackendKind::Memory => Arc::new(MemoryBackend::new()),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn test_settings() -> Settings {
		let mut settings = Settings::defaults().unwrap();
		settings.security.secret_key = "test-secret".to_string();
		settings.session.backend = SessionBackendKind::Memory;
		settings.storage.backend = StorageBackendKind::Memory;
		settings.email.backend = EmailBackendKind::Memory;
		settings
	}

	#[rstest]
	#[tokio::test]
	async fn test_build_from_settings() {
		// Arrange
		let pool = db::connect_in_memory().await.unwrap();

		// Act
		let state = AppState::builder(test_settings(), pool).build().await.unwrap();

		// Assert
		assert_eq!(state.media.name(), "memory");
		assert_eq!(state.bucket(ItemKind::LostFound), "lostfound");
		assert_eq!(state.bucket(ItemKind::Marketplace), "marketplace");
	}

	#[rstest]
	#[tokio::test]
	async fn test_absolute_url_joins_base() {
		let pool = db::connect_in_memory().await.unwrap();
		let mut settings = test_settings();
		settings.server.base_url = "https://campus.example/".to_string();

		let state = AppState::builder(settings, pool).build().await.unwrap();

		assert_eq!(state.absolute_url("/auth/confirm/abc"), "https://campus.example/auth/confirm/abc");
	}

	#[rstest]
	#[tokio::test]
	async fn test_smtp_backend_from_settings() {
		let mut settings = test_settings().email;
		settings.backend = EmailBackendKind::Smtp;
		settings.username = "mailer@campus.example".to_string();
		settings.password = "app-password".to_string();

		assert!(email_backend(&settings).is_ok());
	}
}
