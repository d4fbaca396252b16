//! Fixtures backed by an in-memory SQLite database and in-memory
//! delegates.

use super::client::TestClient;
use crate::apps::accounts::User;
use crate::apps::accounts::models::NewUser;
use crate::apps::accounts::repository as users;
use crate::config::urls::application;
use crate::db;
use crate::state::AppState;
use campus_auth::{Argon2Hasher, InMemorySessionStore, MockTimeProvider, PasswordHasher};
use campus_conf::{EmailBackendKind, SessionBackendKind, Settings, StorageBackendKind};
use campus_http::Handler;
use campus_mail::MemoryBackend;
use campus_storages::backends::MemoryStorage;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Fixed start time of the mock clock.
pub fn test_now() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Fresh single-connection in-memory database with the schema applied.
pub async fn migrated_pool() -> SqlitePool {
	let pool = db::connect_in_memory().await.expect("in-memory database");
	db::migrate(&pool).await.expect("migrations");
	pool
}

/// Built-in defaults with every delegate switched to its in-memory
/// backend.
pub fn test_settings() -> Settings {
	let mut settings = Settings::defaults().expect("default settings");
	settings.security.secret_key = "test-secret-key".to_string();
	settings.server.base_url = "http://testserver".to_string();
	settings.session.backend = SessionBackendKind::Memory;
	settings.email.backend = EmailBackendKind::Memory;
	settings.storage.backend = StorageBackendKind::Memory;
	settings
}

/// Builder for a user row.
#[derive(Debug, Clone)]
pub struct TestUser {
	username: String,
	email: Option<String>,
	password: String,
	confirmed: bool,
	admin: bool,
}

impl TestUser {
	/// A confirmed, non-admin user with [`TEST_PASSWORD`].
	pub fn new(username: &str) -> Self {
		Self {
			username: username.to_string(),
			email: None,
			password: TEST_PASSWORD.to_string(),
			confirmed: true,
			admin: false,
		}
	}

	pub fn email(mut self, email: &str) -> Self {
		self.email = Some(email.to_string());
		self
	}

	pub fn password(mut self, password: &str) -> Self {
		self.password = password.to_string();
		self
	}

	pub fn unconfirmed(mut self) -> Self {
		self.confirmed = false;
		self
	}

	pub fn admin(mut self) -> Self {
		self.admin = true;
		self
	}

	pub async fn insert(self, pool: &SqlitePool) -> User {
		let email = self
			.email
			.unwrap_or_else(|| format!("{}@campus.test", self.username));
		let new_user = NewUser {
			username: self.username,
			email,
			password_hash: Argon2Hasher::new().hash(&self.password).expect("hash password"),
			is_confirmed: self.confirmed,
		};
		let user = users::create(pool, &new_user, test_now()).await.expect("insert user");

		if !self.admin {
			return user;
		}
		sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
			.bind(user.id)
			.execute(pool)
			.await
			.expect("promote user");
		users::find_by_id(pool, user.id)
			.await
			.expect("reload user")
			.expect("user exists")
	}
}

/// The whole application wired to in-memory delegates, with handles on
/// the delegates so tests can inspect or break them.
pub struct TestApp {
	pub state: Arc<AppState>,
	pub handler: Arc<dyn Handler>,
	pub media: MemoryStorage,
	pub mailer: Arc<MemoryBackend>,
	pub clock: Arc<MockTimeProvider>,
}

impl TestApp {
	pub async fn new() -> Self {
		Self::with_settings(test_settings()).await
	}

	pub async fn with_settings(settings: Settings) -> Self {
		let pool = migrated_pool().await;
		let media = MemoryStorage::new();
		let mailer = Arc::new(MemoryBackend::new());
		let clock = Arc::new(MockTimeProvider::new(test_now()));

		let state = AppState::builder(settings, pool)
			.sessions(Arc::new(InMemorySessionStore::new()))
			.media(Arc::new(media.clone()))
			.mailer(mailer.clone())
			.clock(clock.clone())
			.build()
			.await
			.expect("application state");
		let state = Arc::new(state);
		let handler = application(state.clone()).expect("url configuration");

		Self {
			state,
			handler,
			media,
			mailer,
			clock,
		}
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.state.pool
	}

	/// A client with an empty cookie jar.
	pub fn client(&self) -> TestClient {
		TestClient::new(self.handler.clone())
	}

	/// A client already logged in as `username` with [`TEST_PASSWORD`].
	pub async fn login(&self, username: &str) -> TestClient {
		let mut client = self.client();
		let response = client
			.post_form("/auth/login", &[("username", username), ("password", TEST_PASSWORD)])
			.await;
		assert_eq!(
			response.location(),
			Some("/lost-and-found/"),
			"login as {} failed",
			username
		);
		client
	}
}
