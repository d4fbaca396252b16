use super::models::User;
use super::repository;
use async_trait::async_trait;
use campus_auth::AuthenticationBackend;
use campus_core::Result;
use sqlx::SqlitePool;

/// Resolves session user ids against the `users` table.
#[derive(Debug, Clone)]
pub struct DatabaseAuthBackend {
	pool: SqlitePool,
}

impl DatabaseAuthBackend {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl AuthenticationBackend<User> for DatabaseAuthBackend {
	async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
		repository::find_by_id(&self.pool, user_id).await
	}
}
