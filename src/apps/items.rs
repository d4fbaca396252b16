//! Pieces shared by lost & found items and marketplace listings
//!
//! - [`ItemKind`] and [`ImageOwner`], the key of the polymorphic image table
//! - [`Actor`], the acting user as seen by the lifecycle rules
//! - [`LifecycleError`], the ways a transition can be refused
//! - image storage: upload through the media backend, then attach

use crate::apps::accounts::models::User;
use campus_core::validators::{file_extension, is_allowed_image, secure_filename, validate_image_filename};
use campus_core::{Error, Message, Result};
use campus_http::UploadedFile;
use campus_storages::{MediaStorage, UploadOutcome, guess_content_type, unique_object_name};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
	LostFound,
	Marketplace,
}

impl ItemKind {
	/// Discriminant stored in `item_images.item_type` and `categories.type`.
	pub fn as_str(&self) -> &'static str {
		match self {
			ItemKind::LostFound => "lost_found",
			ItemKind::Marketplace => "marketplace",
		}
	}
}

impl fmt::Display for ItemKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ItemKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"lost_found" => Ok(ItemKind::LostFound),
			"marketplace" => Ok(ItemKind::Marketplace),
			other => Err(Error::Validation(format!("Unknown item type: {}", other))),
		}
	}
}

/// The item an image belongs to. Images are only ever looked up by this
/// pair, never by `item_id` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageOwner {
	pub kind: ItemKind,
	pub item_id: i64,
}

impl ImageOwner {
	pub fn new(kind: ItemKind, item_id: i64) -> Self {
		Self { kind, item_id }
	}

	pub fn lost_found(item_id: i64) -> Self {
		Self::new(ItemKind::LostFound, item_id)
	}

	pub fn marketplace(item_id: i64) -> Self {
		Self::new(ItemKind::Marketplace, item_id)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ItemImage {
	pub id: i64,
	pub item_type: String,
	pub item_id: i64,
	pub image_url: String,
	pub uploaded_at: DateTime<Utc>,
}

const IMAGE_COLUMNS: &str = "id, item_type, item_id, image_url, uploaded_at";

pub async fn images_for(pool: &SqlitePool, owner: ImageOwner) -> Result<Vec<ItemImage>> {
	let sql = format!(
		"SELECT {} FROM item_images WHERE item_type = ? AND item_id = ? ORDER BY id",
		IMAGE_COLUMNS
	);
	let images = sqlx::query_as::<_, ItemImage>(&sql)
		.bind(owner.kind.as_str())
		.bind(owner.item_id)
		.fetch_all(pool)
		.await?;
	Ok(images)
}

/// Images of several items of one kind, grouped by item id.
pub async fn images_for_items(
	pool: &SqlitePool,
	kind: ItemKind,
	item_ids: &[i64],
) -> Result<HashMap<i64, Vec<ItemImage>>> {
	let mut grouped: HashMap<i64, Vec<ItemImage>> = HashMap::new();
	if item_ids.is_empty() {
		return Ok(grouped);
	}

	let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM item_images WHERE item_type = ", IMAGE_COLUMNS));
	query.push_bind(kind.as_str());
	query.push(" AND item_id IN (");
	let mut ids = query.separated(", ");
	for id in item_ids {
		ids.push_bind(*id);
	}
	ids.push_unseparated(") ORDER BY id");

	let images: Vec<ItemImage> = query.build_query_as().fetch_all(pool).await?;
	for image in images {
		grouped.entry(image.item_id).or_default().push(image);
	}
	Ok(grouped)
}

/// An item together with its images, as shown on dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct WithImages<T> {
	#[serde(flatten)]
	pub item: T,
	pub images: Vec<ItemImage>,
}

/// Pair each item with its entry in `images`, as returned by
/// [`images_for_items`].
pub fn with_images<T>(
	items: Vec<T>,
	id_of: impl Fn(&T) -> i64,
	images: &HashMap<i64, Vec<ItemImage>>,
) -> Vec<WithImages<T>> {
	items
		.into_iter()
		.map(|item| {
			let images = images.get(&id_of(&item)).cloned().unwrap_or_default();
			WithImages { item, images }
		})
		.collect()
}

/// Insert an image row. Runs on a connection so the caller can share the
/// item's transaction.
pub async fn attach_image(
	conn: &mut SqliteConnection,
	owner: ImageOwner,
	image_url: &str,
	now: DateTime<Utc>,
) -> Result<i64> {
	let id: i64 = sqlx::query_scalar(
		"INSERT INTO item_images (item_type, item_id, image_url, uploaded_at) VALUES (?, ?, ?, ?) RETURNING id",
	)
	.bind(owner.kind.as_str())
	.bind(owner.item_id)
	.bind(image_url)
	.bind(now)
	.fetch_one(&mut *conn)
	.await?;
	Ok(id)
}

/// Hand an uploaded file to the media backend and return its public URL.
///
/// The extension is checked first; a rejected file never reaches the
/// backend. A [`UploadOutcome::Failed`] becomes [`Error::External`] whose
/// message is shown to the uploader.
pub async fn upload_image(storage: &dyn MediaStorage, bucket: &str, file: &UploadedFile) -> Result<String> {
	validate_image_filename(&file.filename)?;

	let mut filename = secure_filename(&file.filename);
	if !is_allowed_image(&filename) {
		let ext = file_extension(&file.filename).unwrap_or_default();
		filename = format!("image.{}", ext);
	}
	let object_name = unique_object_name(&filename);
	let content_type = guess_content_type(&filename);

	match storage.upload(bucket, &object_name, &file.data, &content_type).await {
		UploadOutcome::Uploaded { url } => {
			tracing::info!(backend = storage.name(), bucket, object = %object_name, "image uploaded");
			Ok(url)
		}
		UploadOutcome::Failed { reason } => {
			tracing::warn!(backend = storage.name(), bucket, reason = %reason, "image upload failed");
			Err(Error::External(format!("Image upload failed: {}", reason)))
		}
	}
}

/// The user performing an operation, reduced to what the lifecycle rules
/// look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
	pub user_id: i64,
	pub is_admin: bool,
}

impl Actor {
	pub fn new(user_id: i64, is_admin: bool) -> Self {
		Self { user_id, is_admin }
	}

	pub fn is_owner(&self, owner_id: i64) -> bool {
		self.user_id == owner_id
	}

	/// Edit, delete and tag removal are open to the owner and to admins.
	pub fn can_manage(&self, owner_id: i64) -> bool {
		self.is_owner(owner_id) || self.is_admin
	}
}

impl From<&User> for Actor {
	fn from(user: &User) -> Self {
		Actor::new(user.id, user.is_admin)
	}
}

/// A refused transition. Nothing has been changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
	/// The item is not in a state the transition starts from.
	#[error("Invalid operation.")]
	InvalidTransition,

	/// The actor tried to claim, find or buy their own item.
	#[error("{0}")]
	OwnItem(&'static str),

	#[error("{0}")]
	NotAuthorized(&'static str),

	/// There is nothing to undo.
	#[error("{0}")]
	NothingToRemove(&'static str),
}

impl LifecycleError {
	/// Flash message reporting this refusal.
	pub fn flash(&self) -> Message {
		match self {
			LifecycleError::InvalidTransition | LifecycleError::NotAuthorized(_) => {
				Message::error(self.to_string())
			}
			LifecycleError::OwnItem(_) | LifecycleError::NothingToRemove(_) => {
				Message::warning(self.to_string())
			}
		}
	}
}

impl From<LifecycleError> for Error {
	fn from(err: LifecycleError) -> Self {
		match err {
			LifecycleError::NotAuthorized(msg) => Error::Authorization(msg.to_string()),
			other => Error::Validation(other.to_string()),
		}
	}
}

/// Parse the optional `date` field of an item form. Accepts RFC 3339, the
/// `datetime-local` input format and a bare date; blank means `now`.
pub fn parse_item_date(raw: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
	let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
		return Ok(now);
	};

	if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
		return Ok(parsed.with_timezone(&Utc));
	}
	for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
		if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
			return Ok(parsed.and_utc());
		}
	}
	NaiveDate::parse_from_str(raw, "%Y-%m-%d")
		.ok()
		.and_then(|date| date.and_hms_opt(0, 0, 0))
		.map(|naive| naive.and_utc())
		.ok_or_else(|| Error::Validation("Invalid date".to_string()))
}

/// Optional text field: absent and blank both mean `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
	value
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db;
	use campus_storages::backends::MemoryStorage;
	use chrono::TimeZone;
	use rstest::rstest;

	fn jpeg(filename: &str) -> UploadedFile {
		UploadedFile {
			filename: filename.to_string(),
			content_type: Some("image/jpeg".to_string()),
			data: bytes::Bytes::from_static(b"\xFF\xD8\xFF\xE0"),
		}
	}

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
	}

	#[rstest]
	#[case(1, false, 1, true)]
	#[case(2, false, 1, false)]
	#[case(2, true, 1, true)]
	fn test_can_manage(#[case] actor_id: i64, #[case] is_admin: bool, #[case] owner: i64, #[case] expected: bool) {
		assert_eq!(Actor::new(actor_id, is_admin).can_manage(owner), expected);
	}

	#[rstest]
	fn test_lifecycle_flash_levels() {
		assert_eq!(LifecycleError::InvalidTransition.flash(), Message::error("Invalid operation."));
		assert_eq!(
			LifecycleError::OwnItem("Cannot claim your own item.").flash(),
			Message::warning("Cannot claim your own item.")
		);
	}

	#[rstest]
	#[case(None, now())]
	#[case(Some("  "), now())]
	#[case(Some("2024-02-10"), Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap())]
	#[case(Some("2024-02-10T09:30"), Utc.with_ymd_and_hms(2024, 2, 10, 9, 30, 0).unwrap())]
	#[case(Some("2024-02-10T09:30:00Z"), Utc.with_ymd_and_hms(2024, 2, 10, 9, 30, 0).unwrap())]
	fn test_parse_item_date(#[case] raw: Option<&str>, #[case] expected: DateTime<Utc>) {
		assert_eq!(parse_item_date(raw, now()).unwrap(), expected);
	}

	#[rstest]
	fn test_parse_item_date_rejects_garbage() {
		assert!(matches!(parse_item_date(Some("yesterday"), now()), Err(Error::Validation(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_upload_image_names_object() {
		// Arrange
		let storage = MemoryStorage::new();

		// Act
		let url = upload_image(&storage, "lostfound", &jpeg("my wallet.JPG")).await.unwrap();

		// Assert
		let objects = storage.objects();
		assert_eq!(objects.len(), 1);
		assert!(objects[0].name.ends_with("_my_wallet.JPG"));
		assert_eq!(objects[0].content_type, "image/jpeg");
		assert!(url.ends_with(&objects[0].name));
	}

	#[rstest]
	#[tokio::test]
	async fn test_upload_image_rejects_extension_before_upload() {
		let storage = MemoryStorage::new();

		let result = upload_image(&storage, "lostfound", &jpeg("notes.pdf")).await;

		assert!(matches!(result, Err(Error::Validation(_))));
		assert!(storage.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_upload_failure_carries_reason() {
		let storage = MemoryStorage::new();
		storage.set_failure(Some("Bucket not found"));

		let result = upload_image(&storage, "lostfound", &jpeg("wallet.jpg")).await;

		match result {
			Err(Error::External(message)) => assert_eq!(message, "Image upload failed: Bucket not found"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_images_are_keyed_by_kind_and_id() {
		// Arrange
		let pool = db::connect_in_memory().await.unwrap();
		db::migrate(&pool).await.unwrap();
		let mut conn = pool.acquire().await.unwrap();
		attach_image(&mut *conn, ImageOwner::lost_found(7), "https://cdn/lf.jpg", now()).await.unwrap();
		attach_image(&mut *conn, ImageOwner::marketplace(7), "https://cdn/mk.jpg", now()).await.unwrap();
		drop(conn);

		// Act
		let lost_found = images_for(&pool, ImageOwner::lost_found(7)).await.unwrap();
		let grouped = images_for_items(&pool, ItemKind::Marketplace, &[7, 8]).await.unwrap();

		// Assert
		assert_eq!(lost_found.len(), 1);
		assert_eq!(lost_found[0].image_url, "https://cdn/lf.jpg");
		assert_eq!(grouped[&7].len(), 1);
		assert_eq!(grouped[&7][0].image_url, "https://cdn/mk.jpg");
		assert!(!grouped.contains_key(&8));
	}

	#[rstest]
	fn test_with_images_defaults_to_empty() {
		// Arrange
		let image = ItemImage {
			id: 1,
			item_type: "marketplace".to_string(),
			item_id: 2,
			image_url: "https://cdn/lamp.jpg".to_string(),
			uploaded_at: now(),
		};
		let grouped = HashMap::from([(2, vec![image])]);

		// Act
		let paired = with_images(vec![1_i64, 2], |id| *id, &grouped);

		// Assert
		assert!(paired[0].images.is_empty());
		assert_eq!(paired[1].images.len(), 1);
	}
}
