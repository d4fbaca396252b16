//! Database pool and migrations
//!
//! The schema lives in `migrations/` and is embedded at compile time.

use campus_conf::DatabaseSettings;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open a pool for `settings.url`, creating the database file if needed.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(&settings.url)?
		.create_if_missing(true)
		.foreign_keys(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(settings.max_connections.max(1))
		.connect_with(options)
		.await?;

	tracing::debug!(url = %settings.url, max_connections = settings.max_connections, "database pool opened");
	Ok(pool)
}

/// Single-connection in-memory database. Every connection to
/// `sqlite::memory:` is a separate database, so the pool must never open a
/// second one or let the first expire.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
	SqlitePoolOptions::new()
		.min_connections(1)
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
	MIGRATOR.run(pool).await?;
	tracing::info!("database migrations applied");
	Ok(())
}

/// Run `SELECT 1`. Failures are logged, not returned.
pub async fn check_connection(pool: &SqlitePool) -> bool {
	match sqlx::query("SELECT 1").execute(pool).await {
		Ok(_) => {
			tracing::info!("database connection OK");
			true
		}
		Err(err) => {
			tracing::error!(error = %err, "database connection check failed");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_migrations_create_schema() {
		// Arrange
		let pool = connect_in_memory().await.unwrap();

		// Act
		migrate(&pool).await.unwrap();

		// Assert
		let tables: Vec<(String,)> =
			sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
				.fetch_all(&pool)
				.await
				.unwrap();
		let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();
		for expected in [
			"categories",
			"feedback",
			"item_images",
			"logs",
			"lost_found_items",
			"marketplace_items",
			"notifications",
			"transactions",
			"users",
		] {
			assert!(names.contains(&expected), "missing table {}", expected);
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_item_image_type_is_constrained() {
		let pool = connect_in_memory().await.unwrap();
		migrate(&pool).await.unwrap();

		let result = sqlx::query("INSERT INTO item_images (item_type, item_id, image_url) VALUES ('poster', 1, 'x')")
			.execute(&pool)
			.await;

		assert!(result.is_err());
	}

	#[rstest]
	#[tokio::test]
	async fn test_check_connection() {
		let pool = connect_in_memory().await.unwrap();

		assert!(check_connection(&pool).await);
	}
}
