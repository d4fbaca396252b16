//! Marketplace listings
//!
//! A listing is `available` until someone buys it. Buying has no status
//! precondition: a `sold` listing can be bought again.

use crate::apps::items::{Actor, LifecycleError};
use campus_core::Error;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceStatus {
	Available,
	Sold,
}

impl MarketplaceStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			MarketplaceStatus::Available => "available",
			MarketplaceStatus::Sold => "sold",
		}
	}
}

impl fmt::Display for MarketplaceStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MarketplaceStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"available" => Ok(MarketplaceStatus::Available),
			"sold" => Ok(MarketplaceStatus::Sold),
			other => Err(Error::Validation(format!("Invalid status: {}", other))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketplaceItem {
	pub id: i64,
	pub name: String,
	pub description: Option<String>,
	pub price: Decimal,
	pub category: Option<String>,
	pub condition: Option<String>,
	status: MarketplaceStatus,
	pub date: DateTime<Utc>,
	pub location: Option<String>,
	pub contact_info: Option<String>,
	pub user_id: i64,
	pub views: i64,
	#[serde(skip)]
	is_deleted: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMarketplaceItem {
	pub name: String,
	pub description: Option<String>,
	pub price: Decimal,
	pub category: String,
	pub condition: String,
	pub location: String,
	pub contact_info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceEdit {
	pub name: String,
	pub description: Option<String>,
	pub price: Decimal,
	pub category: String,
	pub condition: String,
	pub location: String,
	pub contact_info: String,
	pub status: MarketplaceStatus,
}

impl MarketplaceItem {
	pub fn status(&self) -> MarketplaceStatus {
		self.status
	}

	pub fn is_deleted(&self) -> bool {
		self.is_deleted
	}

	/// Mark the listing sold to `actor`. Anyone but the seller may buy,
	/// whatever the current status.
	pub fn buy(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		if actor.is_owner(self.user_id) {
			return Err(LifecycleError::OwnItem("You cannot buy your own item"));
		}
		self.status = MarketplaceStatus::Sold;
		Ok(())
	}

	pub fn apply_edit(&mut self, actor: Actor, edit: MarketplaceEdit) -> Result<(), LifecycleError> {
		self.authorize_manage(actor, "You are not authorized to edit this item")?;
		self.name = edit.name;
		self.description = edit.description;
		self.price = edit.price;
		self.category = Some(edit.category);
		self.condition = Some(edit.condition);
		self.location = Some(edit.location);
		self.contact_info = Some(edit.contact_info);
		self.status = edit.status;
		Ok(())
	}

	pub fn soft_delete(&mut self, actor: Actor) -> Result<(), LifecycleError> {
		self.authorize_manage(actor, "You are not authorized to delete this item")?;
		self.is_deleted = true;
		Ok(())
	}

	pub fn authorize_manage(&self, actor: Actor, message: &'static str) -> Result<(), LifecycleError> {
		if actor.can_manage(self.user_id) {
			Ok(())
		} else {
			Err(LifecycleError::NotAuthorized(message))
		}
	}
}

fn decode_error(column: &str, err: Error) -> sqlx::Error {
	sqlx::Error::ColumnDecode {
		index: column.to_string(),
		source: Box::new(err),
	}
}

impl<'r> FromRow<'r, SqliteRow> for MarketplaceItem {
	fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
		let status: String = row.try_get("status")?;
		let status = status
			.parse::<MarketplaceStatus>()
			.map_err(|err| decode_error("status", err))?;
		let price: String = row.try_get("price")?;
		let price = Decimal::from_str(&price)
			.map_err(|err| decode_error("price", Error::Serialization(err.to_string())))?;

		Ok(Self {
			id: row.try_get("id")?,
			name: row.try_get("name")?,
			description: row.try_get("description")?,
			price,
			category: row.try_get("category")?,
			condition: row.try_get("condition")?,
			status,
			date: row.try_get("date")?,
			location: row.try_get("location")?,
			contact_info: row.try_get("contact_info")?,
			user_id: row.try_get("user_id")?,
			views: row.try_get("views")?,
			is_deleted: row.try_get("is_deleted")?,
			created_at: row.try_get("created_at")?,
			updated_at: row.try_get("updated_at")?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use rstest::{fixture, rstest};

	const SELLER: i64 = 1;
	const BUYER: i64 = 2;

	#[fixture]
	fn listing() -> MarketplaceItem {
		let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
		MarketplaceItem {
			id: 4,
			name: "Desk lamp".to_string(),
			description: None,
			price: Decimal::new(1250, 2),
			category: Some("Furniture".to_string()),
			condition: Some("Good".to_string()),
			status: MarketplaceStatus::Available,
			date: at,
			location: Some("Hostel B".to_string()),
			contact_info: Some("9876543210".to_string()),
			user_id: SELLER,
			views: 0,
			is_deleted: false,
			created_at: at,
			updated_at: at,
		}
	}

	#[rstest]
	fn test_buy_marks_sold(mut listing: MarketplaceItem) {
		listing.buy(Actor::new(BUYER, false)).unwrap();

		assert_eq!(listing.status(), MarketplaceStatus::Sold);
	}

	#[rstest]
	fn test_sold_listing_can_be_bought_again(mut listing: MarketplaceItem) {
		listing.buy(Actor::new(BUYER, false)).unwrap();

		let again = listing.buy(Actor::new(3, false));

		assert!(again.is_ok());
		assert_eq!(listing.status(), MarketplaceStatus::Sold);
	}

	#[rstest]
	#[case(false)]
	#[case(true)]
	fn test_seller_cannot_buy(mut listing: MarketplaceItem, #[case] is_admin: bool) {
		let result = listing.buy(Actor::new(SELLER, is_admin));

		assert_eq!(result, Err(LifecycleError::OwnItem("You cannot buy your own item")));
		assert_eq!(listing.status(), MarketplaceStatus::Available);
	}

	#[rstest]
	fn test_edit_can_set_status(mut listing: MarketplaceItem) {
		let edit = MarketplaceEdit {
			name: "Desk lamp (LED)".to_string(),
			description: Some("Warm white".to_string()),
			price: Decimal::new(1000, 2),
			category: "Furniture".to_string(),
			condition: "Like new".to_string(),
			location: "Hostel B".to_string(),
			contact_info: "9876543210".to_string(),
			status: MarketplaceStatus::Sold,
		};

		listing.apply_edit(Actor::new(SELLER, false), edit).unwrap();

		assert_eq!(listing.status(), MarketplaceStatus::Sold);
		assert_eq!(listing.price, Decimal::new(10, 0));
	}

	#[rstest]
	fn test_delete_requires_manager(mut listing: MarketplaceItem) {
		assert!(listing.soft_delete(Actor::new(BUYER, false)).is_err());
		assert!(!listing.is_deleted());

		listing.soft_delete(Actor::new(BUYER, true)).unwrap();
		assert!(listing.is_deleted());
	}

	#[rstest]
	fn test_price_serializes_as_text(listing: MarketplaceItem) {
		let value = serde_json::to_value(&listing).unwrap();

		assert_eq!(value["price"], "12.50");
		assert_eq!(value["status"], "available");
		assert!(value.get("is_deleted").is_none());
	}
}
