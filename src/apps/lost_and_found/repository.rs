//! Persistence for lost & found reports. Soft-deleted rows are invisible
//! to every query here.

use super::models::{LostFoundItem, NewLostFoundItem};
use crate::apps::items::{ImageOwner, attach_image};
use campus_core::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const ITEM_COLUMNS: &str = "id, name, description, category, status, priority, date, location, contact_info, \
	latitude, longitude, user_id, found_by, claimed_by, views, is_deleted, created_at, updated_at";

pub const NOT_FOUND_MESSAGE: &str = "Item not found";

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
	/// Newest `date` first.
	DateDesc,
	/// Highest `priority` first, newest first among equals.
	PriorityDesc,
}

impl Ordering {
	fn order_by(&self) -> &'static str {
		match self {
			Ordering::DateDesc => "date DESC, id DESC",
			Ordering::PriorityDesc => "priority DESC, date DESC, id DESC",
		}
	}
}

pub async fn list(pool: &SqlitePool, ordering: Ordering) -> Result<Vec<LostFoundItem>> {
	let sql = format!(
		"SELECT {} FROM lost_found_items WHERE is_deleted = 0 ORDER BY {}",
		ITEM_COLUMNS,
		ordering.order_by()
	);
	Ok(sqlx::query_as::<_, LostFoundItem>(&sql).fetch_all(pool).await?)
}

pub async fn list_by_owner(pool: &SqlitePool, user_id: i64) -> Result<Vec<LostFoundItem>> {
	let sql = format!(
		"SELECT {} FROM lost_found_items WHERE is_deleted = 0 AND user_id = ? ORDER BY {}",
		ITEM_COLUMNS,
		Ordering::DateDesc.order_by()
	);
	Ok(sqlx::query_as::<_, LostFoundItem>(&sql)
		.bind(user_id)
		.fetch_all(pool)
		.await?)
}

/// Fetch a live item. Missing and soft-deleted rows are both `NotFound`.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<LostFoundItem> {
	let sql = format!(
		"SELECT {} FROM lost_found_items WHERE id = ? AND is_deleted = 0",
		ITEM_COLUMNS
	);
	sqlx::query_as::<_, LostFoundItem>(&sql)
		.bind(id)
		.fetch_optional(pool)
		.await?
		.ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
}

/// Insert a report and its image in one transaction.
pub async fn create(
	pool: &SqlitePool,
	item: &NewLostFoundItem,
	owner_id: i64,
	image_url: &str,
	now: DateTime<Utc>,
) -> Result<LostFoundItem> {
	let mut tx = pool.begin().await?;

	let sql = format!(
		"INSERT INTO lost_found_items \
		 (name, description, category, status, priority, date, location, contact_info, latitude, longitude, \
		  user_id, created_at, updated_at) \
		 VALUES (?, ?, ?, 'lost', ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
		ITEM_COLUMNS
	);
	let created = sqlx::query_as::<_, LostFoundItem>(&sql)
		.bind(&item.name)
		.bind(item.description.as_deref())
		.bind(&item.category)
		.bind(item.priority)
		.bind(item.date)
		.bind(&item.location)
		.bind(&item.contact_info)
		.bind(item.latitude)
		.bind(item.longitude)
		.bind(owner_id)
		.bind(now)
		.bind(now)
		.fetch_one(&mut *tx)
		.await?;

	attach_image(&mut *tx, ImageOwner::lost_found(created.id), image_url, now).await?;
	tx.commit().await?;

	tracing::info!(item_id = created.id, user_id = owner_id, "lost & found report created");
	Ok(created)
}

/// Write back every mutable field of `item`, optionally attaching a new
/// image in the same transaction.
pub async fn save(
	pool: &SqlitePool,
	item: &LostFoundItem,
	new_image: Option<&str>,
	now: DateTime<Utc>,
) -> Result<()> {
	let mut tx = pool.begin().await?;

	sqlx::query(
		"UPDATE lost_found_items SET \
		 name = ?, description = ?, category = ?, status = ?, priority = ?, location = ?, contact_info = ?, \
		 found_by = ?, claimed_by = ?, is_deleted = ?, updated_at = ? \
		 WHERE id = ?",
	)
	.bind(&item.name)
	.bind(item.description.as_deref())
	.bind(item.category.as_deref())
	.bind(item.status().as_str())
	.bind(item.priority)
	.bind(item.location.as_deref())
	.bind(item.contact_info.as_deref())
	.bind(item.found_by())
	.bind(item.claimed_by())
	.bind(item.is_deleted())
	.bind(now)
	.bind(item.id)
	.execute(&mut *tx)
	.await?;

	if let Some(url) = new_image {
		attach_image(&mut *tx, ImageOwner::lost_found(item.id), url, now).await?;
	}
	tx.commit().await?;

	tracing::debug!(item_id = item.id, status = %item.status(), "lost & found item saved");
	Ok(())
}

pub async fn increment_views(pool: &SqlitePool, id: i64) -> Result<()> {
	sqlx::query("UPDATE lost_found_items SET views = views + 1 WHERE id = ? AND is_deleted = 0")
		.bind(id)
		.execute(pool)
		.await?;
	Ok(())
}

/// Soft-delete `id` only if it belongs to `owner_id`. Returns whether a
/// row was deleted.
pub async fn soft_delete_owned(pool: &SqlitePool, id: i64, owner_id: i64, now: DateTime<Utc>) -> Result<bool> {
	let result = sqlx::query(
		"UPDATE lost_found_items SET is_deleted = 1, updated_at = ? WHERE id = ? AND user_id = ? AND is_deleted = 0",
	)
	.bind(now)
	.bind(id)
	.bind(owner_id)
	.execute(pool)
	.await?;
	Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::apps::items::{Actor, images_for};
	use crate::apps::lost_and_found::models::LostFoundStatus;
	use crate::test_utils::fixtures::{TestUser, migrated_pool};
	use chrono::{Duration, TimeZone};
	use rstest::{fixture, rstest};

	#[fixture]
	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
	}

	fn report(name: &str, priority: i64, date: DateTime<Utc>) -> NewLostFoundItem {
		NewLostFoundItem {
			name: name.to_string(),
			description: None,
			category: "Electronics".to_string(),
			priority,
			date,
			location: "Library".to_string(),
			contact_info: "9876543210".to_string(),
			latitude: None,
			longitude: None,
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_starts_lost_with_image(now: DateTime<Utc>) {
		// Arrange
		let pool = migrated_pool().await;
		let owner = TestUser::new("owner").insert(&pool).await;

		// Act
		let item = create(&pool, &report("Calculator", 1, now), owner.id, "https://cdn/calc.jpg", now)
			.await
			.unwrap();

		// Assert
		assert_eq!(item.status(), LostFoundStatus::Lost);
		assert_eq!(item.views, 0);
		let images = images_for(&pool, ImageOwner::lost_found(item.id)).await.unwrap();
		assert_eq!(images.len(), 1);
		assert_eq!(images[0].item_type, "lost_found");
	}

	#[rstest]
	#[tokio::test]
	async fn test_list_orderings(now: DateTime<Utc>) {
		let pool = migrated_pool().await;
		let owner = TestUser::new("owner").insert(&pool).await;
		let old = create(&pool, &report("Old", 5, now - Duration::days(2)), owner.id, "u1", now)
			.await
			.unwrap();
		let new = create(&pool, &report("New", 1, now), owner.id, "u2", now).await.unwrap();

		let by_date = list(&pool, Ordering::DateDesc).await.unwrap();
		let by_priority = list(&pool, Ordering::PriorityDesc).await.unwrap();

		assert_eq!(by_date.iter().map(|i| i.id).collect::<Vec<_>>(), vec![new.id, old.id]);
		assert_eq!(by_priority.iter().map(|i| i.id).collect::<Vec<_>>(), vec![old.id, new.id]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_deleted_items_are_invisible(now: DateTime<Utc>) {
		// Arrange
		let pool = migrated_pool().await;
		let owner = TestUser::new("owner").insert(&pool).await;
		let mut item = create(&pool, &report("Umbrella", 1, now), owner.id, "u", now).await.unwrap();

		// Act
		item.soft_delete(Actor::new(owner.id, false)).unwrap();
		save(&pool, &item, None, now).await.unwrap();

		// Assert
		assert!(list(&pool, Ordering::DateDesc).await.unwrap().is_empty());
		assert!(list_by_owner(&pool, owner.id).await.unwrap().is_empty());
		assert!(matches!(get(&pool, item.id).await, Err(Error::NotFound(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_save_persists_transition(now: DateTime<Utc>) {
		let pool = migrated_pool().await;
		let owner = TestUser::new("owner").insert(&pool).await;
		let finder = TestUser::new("finder").insert(&pool).await;
		let mut item = create(&pool, &report("Keys", 1, now), owner.id, "u", now).await.unwrap();

		item.mark_found(Actor::new(finder.id, false)).unwrap();
		save(&pool, &item, Some("https://cdn/second.jpg"), now).await.unwrap();

		let stored = get(&pool, item.id).await.unwrap();
		assert_eq!(stored.status(), LostFoundStatus::Found);
		assert_eq!(stored.found_by(), Some(finder.id));
		assert_eq!(images_for(&pool, ImageOwner::lost_found(item.id)).await.unwrap().len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_soft_delete_owned_only(now: DateTime<Utc>) {
		let pool = migrated_pool().await;
		let owner = TestUser::new("owner").insert(&pool).await;
		let other = TestUser::new("other").insert(&pool).await;
		let item = create(&pool, &report("Scarf", 1, now), owner.id, "u", now).await.unwrap();

		assert!(!soft_delete_owned(&pool, item.id, other.id, now).await.unwrap());
		assert!(soft_delete_owned(&pool, item.id, owner.id, now).await.unwrap());
		assert!(!soft_delete_owned(&pool, item.id, owner.id, now).await.unwrap());
	}

	#[rstest]
	#[tokio::test]
	async fn test_increment_views(now: DateTime<Utc>) {
		let pool = migrated_pool().await;
		let owner = TestUser::new("owner").insert(&pool).await;
		let item = create(&pool, &report("Wallet", 1, now), owner.id, "u", now).await.unwrap();

		increment_views(&pool, item.id).await.unwrap();
		increment_views(&pool, item.id).await.unwrap();

		assert_eq!(get(&pool, item.id).await.unwrap().views, 2);
	}
}
