use campus_auth::AuthUser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Username of the shared guest account used by "continue without login".
pub const GUEST_USERNAME: &str = "temp";

pub const DEFAULT_ROLE: &str = "student";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub email: String,
	/// Argon2 PHC string.
	#[serde(skip_serializing)]
	pub password: String,
	pub role: String,
	pub profile_image: Option<String>,
	pub status: String,
	pub last_login: Option<DateTime<Utc>>,
	pub is_admin: bool,
	pub is_confirmed: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl User {
	/// Whether this is the shared guest account. The guest may browse,
	/// claim and buy but never publish.
	pub fn is_guest(&self) -> bool {
		self.username == GUEST_USERNAME
	}
}

impl AuthUser for User {
	fn id(&self) -> i64 {
		self.id
	}

	fn username(&self) -> &str {
		&self.username
	}

	fn is_admin(&self) -> bool {
		self.is_admin
	}
}

/// Fields of a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub username: String,
	pub email: String,
	pub password_hash: String,
	pub is_confirmed: bool,
}

/// Profile changes that passed validation. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
	pub username: Option<String>,
	pub email: Option<String>,
	pub role: Option<String>,
	pub password_hash: Option<String>,
}

impl ProfileChanges {
	pub fn is_empty(&self) -> bool {
		self.username.is_none() && self.email.is_none() && self.role.is_none() && self.password_hash.is_none()
	}
}
