//! Report and edit form parsing

use super::models::{LostFoundEdit, LostFoundStatus, NewLostFoundItem};
use crate::apps::items::{optional_text, parse_item_date};
use campus_core::validators::validate_contact_info;
use campus_core::{Error, Result};
use campus_http::FormData;
use chrono::{DateTime, Utc};

/// Form field holding the image on the report page.
pub const CREATE_IMAGE_FIELD: &str = "image";
/// Form field holding the optional replacement image on the edit page.
pub const EDIT_IMAGE_FIELD: &str = "image_path";

pub fn parse_new_item(form: &FormData, now: DateTime<Utc>) -> Result<NewLostFoundItem> {
	let contact_info = validate_contact_info(form.get_or_empty("contact_info"))?;

	Ok(NewLostFoundItem {
		name: form.required("name")?.trim().to_string(),
		description: optional_text(form.get("description")),
		category: form.required("category")?.trim().to_string(),
		priority: optional_number(form, "priority")?.unwrap_or(1),
		date: parse_item_date(form.get("date"), now)?,
		location: form.required("location")?.trim().to_string(),
		contact_info,
		latitude: optional_number(form, "latitude")?,
		longitude: optional_number(form, "longitude")?,
	})
}

pub fn parse_edit(form: &FormData) -> Result<LostFoundEdit> {
	let contact_info = validate_contact_info(form.get_or_empty("contact_info"))?;

	Ok(LostFoundEdit {
		priority: optional_number(form, "priority")?,
		name: form.required("name")?.trim().to_string(),
		description: optional_text(form.get("description")),
		category: form.required("category")?.trim().to_string(),
		status: form.parse::<LostFoundStatus>("status")?,
		location: form.required("location")?.trim().to_string(),
		contact_info,
	})
}

/// Blank means absent; anything else must parse.
fn optional_number<T: std::str::FromStr>(form: &FormData, name: &str) -> Result<Option<T>> {
	match optional_text(form.get(name)) {
		None => Ok(None),
		Some(raw) => raw
			.parse::<T>()
			.map(Some)
			.map_err(|_| Error::Validation(format!("Invalid value for field: {}", name))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use campus_core::validators::CONTACT_INFO_MESSAGE;
	use chrono::TimeZone;
	use rstest::{fixture, rstest};

	#[fixture]
	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
	}

	#[fixture]
	fn report() -> FormData {
		FormData::new()
			.with_field("name", "Calculator")
			.with_field("category", "Electronics")
			.with_field("location", "Room 204")
			.with_field("contact_info", " 9876543210 ")
	}

	#[rstest]
	fn test_defaults(report: FormData, now: DateTime<Utc>) {
		let item = parse_new_item(&report, now).unwrap();

		assert_eq!(item.priority, 1);
		assert_eq!(item.date, now);
		assert_eq!(item.contact_info, "9876543210");
		assert_eq!(item.description, None);
		assert_eq!(item.latitude, None);
	}

	#[rstest]
	fn test_coordinates_and_priority(report: FormData, now: DateTime<Utc>) {
		let form = report
			.with_field("priority", "3")
			.with_field("latitude", "12.97")
			.with_field("longitude", "77.59");

		let item = parse_new_item(&form, now).unwrap();

		assert_eq!(item.priority, 3);
		assert_eq!(item.latitude, Some(12.97));
		assert_eq!(item.longitude, Some(77.59));
	}

	#[rstest]
	#[case("12345")]
	#[case("98765432101")]
	#[case("98765-4321")]
	#[case("")]
	fn test_contact_info_is_validated(now: DateTime<Utc>, #[case] contact: &str) {
		let form = report().with_field("contact_info", contact);

		match parse_new_item(&form, now) {
			Err(Error::Validation(message)) => assert_eq!(message, CONTACT_INFO_MESSAGE),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[rstest]
	fn test_missing_field(now: DateTime<Utc>) {
		let form = FormData::new()
			.with_field("name", "Calculator")
			.with_field("contact_info", "9876543210");

		match parse_new_item(&form, now) {
			Err(Error::Validation(message)) => assert_eq!(message, "Missing required field: category"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[rstest]
	fn test_edit_requires_valid_status(report: FormData) {
		assert!(parse_edit(&report).is_err());

		let edit = parse_edit(&report.with_field("status", "found")).unwrap();

		assert_eq!(edit.status, LostFoundStatus::Found);
		assert_eq!(edit.priority, None);
	}
}
