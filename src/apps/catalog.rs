//! Category catalog: static reference data tagging items by domain.

use crate::apps::items::ItemKind;
use campus_core::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Categories installed by `manage seed-categories`.
pub const SEED_CATEGORIES: [(&str, ItemKind); 5] = [
	("Electronics", ItemKind::LostFound),
	("Books", ItemKind::LostFound),
	("Clothing", ItemKind::LostFound),
	("Accessories", ItemKind::LostFound),
	("Other", ItemKind::LostFound),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
	pub id: i64,
	pub name: String,
	#[serde(rename = "type")]
	#[sqlx(rename = "type")]
	pub kind: String,
	pub description: Option<String>,
	pub parent_id: Option<i64>,
}

pub async fn list_by_kind(pool: &SqlitePool, kind: ItemKind) -> Result<Vec<Category>> {
	Ok(sqlx::query_as::<_, Category>(
		"SELECT id, name, type, description, parent_id FROM categories WHERE type = ? ORDER BY id",
	)
	.bind(kind.as_str())
	.fetch_all(pool)
	.await?)
}

/// Install [`SEED_CATEGORIES`]. Existing rows are left alone, so running
/// it again is harmless. Returns how many rows were added.
pub async fn seed(pool: &SqlitePool) -> Result<u64> {
	let mut tx = pool.begin().await?;
	let mut added = 0;
	for (name, kind) in SEED_CATEGORIES {
		added += sqlx::query("INSERT OR IGNORE INTO categories (name, type) VALUES (?, ?)")
			.bind(name)
			.bind(kind.as_str())
			.execute(&mut *tx)
			.await?
			.rows_affected();
	}
	tx.commit().await?;

	tracing::info!(added, "categories seeded");
	Ok(added)
}
