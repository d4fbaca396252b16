//! Lost & found reports and their status machine
//!
//! ```text
//!   lost ──mark_found──▶ found ──claim──▶ claimed
//!                          ▲                 │
//!                          └──remove_claim───┘
//! ```
//!
//! Status, `found_by` and `claimed_by` are private. Only the transition
//! methods below change them.

use crate::apps::items::{Actor, LifecycleError};
use campus_core::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LostFoundStatus {
	Lost,
	Found,
	Claimed,
}

impl LostFoundStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			LostFoundStatus::Lost => "lost",
			LostFoundStatus::Found => "found",
			LostFoundStatus::Claimed => "claimed",
		}
	}
}

impl fmt::Display for LostFoundStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for LostFoundStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"lost" => Ok(LostFoundStatus::Lost),
			"found" => Ok(LostFoundStatus::Found),
			"claimed" => Ok(LostFoundStatus::Claimed),
			other => Err(Error::Validation(format!("Invalid status: {}", other))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LostFoundItem {
	pub id: i64,
	pub name: String,
	pub description: Option<String>,
	pub category: Option<String>,
	status: LostFoundStatus,
	pub priority: i64,
	pub date: DateTime<Utc>,
	pub location: Option<String>,
	pub contact_info: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub user_id: i64,
	found_by: Option<i64>,
	claimed_by: Option<i64>,
	pub views: i64,
	#[serde(skip)]
	is_deleted: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Validated fields of a new report. Every report starts `lost`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLostFoundItem {
	pub name: String,
	pub description: Option<String>,
	pub category: String,
	pub priority: i64,
	pub date: DateTime<Utc>,
	pub location: String,
	pub contact_info: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

/// Validated fields of an edit submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LostFoundEdit {
	pub priority: Option<i64>,
	pub name: String,
	pub description: Option<String>,
	pub category: String,
	pub status: LostFoundStatus,
	pub location: String,
	pub contact_info: String,
}

impl LostFoundItem {
	pub fn status(&self) -> LostFoundStatus {
		self.status
	}

	pub fn found_by(&self) -> Option<i64> {
		self.found_by
	}

	pub fn claimed_by(&self) -> Option<i64> {
		self.claimed_by
	}

	pub fn is_deleted(&self) -> bool {
		self.is_deleted
	}

	/// `lost → found`, recording the finder.
	pub fn mark_found(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		if self.status != LostFoundStatus::Lost {
			return Err(LifecycleError::InvalidTransition);
		}
		if actor.is_owner(self.user_id) {
			return Err(LifecycleError::OwnItem("Cannot mark your own item as found."));
		}
		self.status = LostFoundStatus::Found;
		self.found_by = Some(actor.user_id);
		Ok(())
	}

	/// `found → claimed`, recording the claimant.
	pub fn claim(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		if self.status != LostFoundStatus::Found {
			return Err(LifecycleError::InvalidTransition);
		}
		if actor.is_owner(self.user_id) {
			return Err(LifecycleError::OwnItem("Cannot claim your own item."));
		}
		self.status = LostFoundStatus::Claimed;
		self.claimed_by = Some(actor.user_id);
		Ok(())
	}

	/// `claimed → found`, dropping the claimant.
	pub fn remove_claim(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		if !actor.can_manage(self.user_id) {
			return Err(LifecycleError::NotAuthorized("Not authorized to remove claim."));
		}
		if self.status != LostFoundStatus::Claimed {
			return Err(LifecycleError::NothingToRemove("Item is not claimed."));
		}
		self.status = LostFoundStatus::Found;
		self.claimed_by = None;
		Ok(())
	}

	/// Clear the finder. Status is left as it is, so a `found` item may end
	/// up with no finder.
	pub fn remove_found_tag(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		if !actor.can_manage(self.user_id) {
			return Err(LifecycleError::NotAuthorized("Not authorized to remove found tag."));
		}
		if self.found_by.is_none() {
			return Err(LifecycleError::NothingToRemove("No found tag to remove."));
		}
		self.found_by = None;
		Ok(())
	}

	/// Owner or admin edit. The new status goes through [`Self::set_status`]
	/// so tags never outlive the status they belong to.
	pub fn apply_edit(&mut self, actor: Actor, edit: LostFoundEdit) -> Result<(), LifecycleError> {
		self.authorize_manage(actor, "You are not authorized to edit this item")?;
		if let Some(priority) = edit.priority {
			self.priority = priority;
		}
		self.name = edit.name;
		self.description = edit.description;
		self.category = Some(edit.category);
		self.location = Some(edit.location);
		self.contact_info = Some(edit.contact_info);
		self.set_status(edit.status);
		Ok(())
	}

	pub fn soft_delete(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		self.authorize_manage(actor, "You are not authorized to delete this item")?;
		self.is_deleted = true;
		Ok(())
	}

	/// Check that `actor` may edit or delete this item.
	pub fn authorize_manage(&self, actor: Actor, message: &'static str) -> Result<(), LifecycleError> {
		if actor.can_manage(self.user_id) {
			Ok(())
		} else {
			Err(LifecycleError::NotAuthorized(message))
		}
	}

	fn set_status(&mut self, status: LostFoundStatus) {
		self.status = status;
		if status != LostFoundStatus::Found {
			self.found_by = None;
		}
		if status != LostFoundStatus::Claimed {
			self.claimed_by = None;
		}
	}
}

impl<'r> FromRow<'r, SqliteRow> for LostFoundItem {
	fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
		let status: String = row.try_get("status")?;
		let status = status.parse::<LostFoundStatus>().map_err(|err| sqlx::Error::ColumnDecode {
			index: "status".to_string(),
			source: Box::new(err),
		})?;

		Ok(Self {
			id: row.try_get("id")?,
			name: row.try_get("name")?,
			description: row.try_get("description")?,
			category: row.try_get("category")?,
			status,
			priority: row.try_get("priority")?,
			date: row.try_get("date")?,
			location: row.try_get("location")?,
			contact_info: row.try_get("contact_info")?,
			latitude: row.try_get("latitude")?,
			longitude: row.try_get("longitude")?,
			user_id: row.try_get("user_id")?,
			found_by: row.try_get("found_by")?,
			claimed_by: row.try_get("claimed_by")?,
			views: row.try_get("views")?,
			is_deleted: row.try_get("is_deleted")?,
			created_at: row.try_get("created_at")?,
			updated_at: row.try_get("updated_at")?,
		})
	}
}

#[cfg(test)]
pub(crate) fn item_fixture(owner: i64, status: LostFoundStatus) -> LostFoundItem {
	use chrono::TimeZone;
	let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
	LostFoundItem {
		id: 1,
		name: "Blue water bottle".to_string(),
		description: None,
		category: Some("Accessories".to_string()),
		status,
		priority: 1,
		date: at,
		location: Some("Library".to_string()),
		contact_info: Some("9876543210".to_string()),
		latitude: None,
		longitude: None,
		user_id: owner,
		found_by: None,
		claimed_by: None,
		views: 0,
		is_deleted: false,
		created_at: at,
		updated_at: at,
	}
}
