//! Queries over the `users` table

use super::models::{GUEST_USERNAME, NewUser, ProfileChanges, User};
use campus_auth::PasswordHasher;
use campus_core::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub const DUPLICATE_ACCOUNT_MESSAGE: &str = "Username or email already exists. Please choose another.";

const USER_COLUMNS: &str = "id, username, email, password, role, profile_image, status, last_login, \
	is_admin, is_confirmed, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
	let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
	Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
	let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
	Ok(sqlx::query_as::<_, User>(&sql)
		.bind(username)
		.fetch_optional(pool)
		.await?)
}

/// Whether either value is already registered. Exact, case-sensitive match.
pub async fn username_or_email_taken(pool: &SqlitePool, username: &str, email: &str) -> Result<bool> {
	let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = ? OR email = ?)")
		.bind(username)
		.bind(email)
		.fetch_one(pool)
		.await?;
	Ok(taken)
}

/// Whether `username` belongs to an account other than `user_id`.
pub async fn username_taken_by_other(pool: &SqlitePool, username: &str, user_id: i64) -> Result<bool> {
	let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = ? AND id != ?)")
		.bind(username)
		.bind(user_id)
		.fetch_one(pool)
		.await?;
	Ok(taken)
}

pub async fn email_taken_by_other(pool: &SqlitePool, email: &str, user_id: i64) -> Result<bool> {
	let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = ? AND id != ?)")
		.bind(email)
		.bind(user_id)
		.fetch_one(pool)
		.await?;
	Ok(taken)
}

/// Insert a new account. A unique constraint hit (for instance a
/// concurrent registration of the same name) is reported as a duplicate.
pub async fn create(pool: &SqlitePool, user: &NewUser, now: DateTime<Utc>) -> Result<User> {
	let sql = format!(
		"INSERT INTO users (username, email, password, is_confirmed, created_at, updated_at) \
		 VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
		USER_COLUMNS
	);
	let created = sqlx::query_as::<_, User>(&sql)
		.bind(&user.username)
		.bind(&user.email)
		.bind(&user.password_hash)
		.bind(user.is_confirmed)
		.bind(now)
		.bind(now)
		.fetch_one(pool)
		.await
		.map_err(|err| match err.as_database_error() {
			Some(db) if db.is_unique_violation() => Error::Validation(DUPLICATE_ACCOUNT_MESSAGE.to_string()),
			_ => Error::from(err),
		})?;

	tracing::info!(user_id = created.id, username = %created.username, "user registered");
	Ok(created)
}

/// Mark the account registered under `email` as confirmed. Returns
/// `false` when no such account exists.
pub async fn confirm_email(pool: &SqlitePool, email: &str, now: DateTime<Utc>) -> Result<bool> {
	let result = sqlx::query("UPDATE users SET is_confirmed = 1, updated_at = ? WHERE email = ?")
		.bind(now)
		.bind(email)
		.execute(pool)
		.await?;
	Ok(result.rows_affected() > 0)
}

pub async fn record_login(pool: &SqlitePool, user_id: i64, now: DateTime<Utc>) -> Result<()> {
	sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
		.bind(now)
		.bind(user_id)
		.execute(pool)
		.await?;
	Ok(())
}

/// Apply validated profile changes in one statement.
pub async fn update_profile(
	pool: &SqlitePool,
	user_id: i64,
	changes: &ProfileChanges,
	now: DateTime<Utc>,
) -> Result<()> {
	sqlx::query(
		"UPDATE users SET \
		 username = COALESCE(?, username), \
		 email = COALESCE(?, email), \
		 role = COALESCE(?, role), \
		 password = COALESCE(?, password), \
		 updated_at = ? \
		 WHERE id = ?",
	)
	.bind(changes.username.as_deref())
	.bind(changes.email.as_deref())
	.bind(changes.role.as_deref())
	.bind(changes.password_hash.as_deref())
	.bind(now)
	.bind(user_id)
	.execute(pool)
	.await
	.map_err(|err| match err.as_database_error() {
		Some(db) if db.is_unique_violation() => {
			Error::Validation("Username or email already taken.".to_string())
		}
		_ => Error::from(err),
	})?;
	Ok(())
}

/// Provision the confirmed guest account if it does not exist yet. Its
/// password is random and never disclosed, so it can only be entered
/// through "continue without login".
pub async fn ensure_guest(pool: &SqlitePool, hasher: &dyn PasswordHasher, now: DateTime<Utc>) -> Result<User> {
	if let Some(existing) = find_by_username(pool, GUEST_USERNAME).await? {
		return Ok(existing);
	}

	let password_hash = hasher.hash(&uuid::Uuid::new_v4().simple().to_string())?;
	create(
		pool,
		&NewUser {
			username: GUEST_USERNAME.to_string(),
			email: format!("{}@guest.invalid", GUEST_USERNAME),
			password_hash,
			is_confirmed: true,
		},
		now,
	)
	.await
}
