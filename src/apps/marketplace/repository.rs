//! Persistence for marketplace listings. Prices are stored as decimal text.

use super::models::{MarketplaceItem, NewMarketplaceItem};
use crate::apps::items::{ImageOwner, attach_image};
use campus_core::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const ITEM_COLUMNS: &str = "id, name, description, price, category, condition, status, date, location, contact_info, \
	user_id, views, is_deleted, created_at, updated_at";

pub const NOT_FOUND_MESSAGE: &str = "Item not found";

/// Live listings, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<MarketplaceItem>> {
	let sql = format!(
		"SELECT {} FROM marketplace_items WHERE is_deleted = 0 ORDER BY date DESC, id DESC",
		ITEM_COLUMNS
	);
	Ok(sqlx::query_as::<_, MarketplaceItem>(&sql).fetch_all(pool).await?)
}

pub async fn list_by_owner(pool: &SqlitePool, user_id: i64) -> Result<Vec<MarketplaceItem>> {
	let sql = format!(
		"SELECT {} FROM marketplace_items WHERE is_deleted = 0 AND user_id = ? ORDER BY date DESC, id DESC",
		ITEM_COLUMNS
	);
	Ok(sqlx::query_as::<_, MarketplaceItem>(&sql)
		.bind(user_id)
		.fetch_all(pool)
		.await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<MarketplaceItem> {
	let sql = format!(
		"SELECT {} FROM marketplace_items WHERE id = ? AND is_deleted = 0",
		ITEM_COLUMNS
	);
	sqlx::query_as::<_, MarketplaceItem>(&sql)
		.bind(id)
		.fetch_optional(pool)
		.await?
		.ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
}

/// Insert a listing and its image in one transaction. The listing date is
/// the creation time.
pub async fn create(
	pool: &SqlitePool,
	item: &NewMarketplaceItem,
	seller_id: i64,
	image_url: &str,
	now: DateTime<Utc>,
) -> Result<MarketplaceItem> {
	let mut tx = pool.begin().await?;

	let sql = format!(
		"INSERT INTO marketplace_items \
		 (name, description, price, category, condition, status, date, location, contact_info, \
		  user_id, created_at, updated_at) \
		 VALUES (?, ?, ?, ?, ?, 'available', ?, ?, ?, ?, ?, ?) RETURNING {}",
		ITEM_COLUMNS
	);
	let created = sqlx::query_as::<_, MarketplaceItem>(&sql)
		.bind(&item.name)
		.bind(item.description.as_deref())
		.bind(item.price.to_string())
		.bind(&item.category)
		.bind(&item.condition)
		.bind(now)
		.bind(&item.location)
		.bind(&item.contact_info)
		.bind(seller_id)
		.bind(now)
		.bind(now)
		.fetch_one(&mut *tx)
		.await?;

	attach_image(&mut *tx, ImageOwner::marketplace(created.id), image_url, now).await?;
	tx.commit().await?;

	tracing::info!(item_id = created.id, user_id = seller_id, "marketplace listing created");
	Ok(created)
}

pub async fn save(
	pool: &SqlitePool,
	item: &MarketplaceItem,
	new_image: Option<&str>,
	now: DateTime<Utc>,
) -> Result<()> {
	let mut tx = pool.begin().await?;

	sqlx::query(
		"UPDATE marketplace_items SET \
		 name = ?, description = ?, price = ?, category = ?, condition = ?, status = ?, location = ?, \
		 contact_info = ?, is_deleted = ?, updated_at = ? \
		 WHERE id = ?",
	)
	.bind(&item.name)
	.bind(item.description.as_deref())
	.bind(item.price.to_string())
	.bind(item.category.as_deref())
	.bind(item.condition.as_deref())
	.bind(item.status().as_str())
	.bind(item.location.as_deref())
	.bind(item.contact_info.as_deref())
	.bind(item.is_deleted())
	.bind(now)
	.bind(item.id)
	.execute(&mut *tx)
	.await?;

	if let Some(url) = new_image {
		attach_image(&mut *tx, ImageOwner::marketplace(item.id), url, now).await?;
	}
	tx.commit().await?;

	tracing::debug!(item_id = item.id, status = %item.status(), "marketplace listing saved");
	Ok(())
}

pub async fn increment_views(pool: &SqlitePool, id: i64) -> Result<()> {
	sqlx::query("UPDATE marketplace_items SET views = views + 1 WHERE id = ? AND is_deleted = 0")
		.bind(id)
		.execute(pool)
		.await?;
	Ok(())
}

/// Soft-delete `id` only if `owner_id` listed it.
pub async fn soft_delete_owned(pool: &SqlitePool, id: i64, owner_id: i64, now: DateTime<Utc>) -> Result<bool> {
	let result = sqlx::query(
		"UPDATE marketplace_items SET is_deleted = 1, updated_at = ? WHERE id = ? AND user_id = ? AND is_deleted = 0",
	)
	.bind(now)
	.bind(id)
	.bind(owner_id)
	.execute(pool)
	.await?;
	Ok(result.rows_affected() > 0)
}
