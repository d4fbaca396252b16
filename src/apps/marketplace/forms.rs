use super::models::{MarketplaceEdit, MarketplaceStatus, NewMarketplaceItem};
use crate::apps::items::optional_text;
use campus_core::{Error, Result};
use campus_http::FormData;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const CREATE_IMAGE_FIELD: &str = "image";
pub const EDIT_IMAGE_FIELD: &str = "image_path";

pub const PRICE_MESSAGE: &str = "Price must be a non-negative number";

/// Parse a price as entered in the listing form, keeping its scale so
/// `"12.50"` is shown back as `12.50`.
pub fn parse_price(raw: &str) -> Result<Decimal> {
	match Decimal::from_str(raw.trim()) {
		Ok(price) if !price.is_sign_negative() => Ok(price),
		Ok(zero) if zero.is_zero() => Ok(Decimal::ZERO),
		_ => Err(Error::Validation(PRICE_MESSAGE.to_string())),
	}
}

pub fn parse_new_item(form: &FormData) -> Result<NewMarketplaceItem> {
	Ok(NewMarketplaceItem {
		name: form.required("name")?.trim().to_string(),
		description: optional_text(form.get("description")),
		price: parse_price(form.required("price")?)?,
		category: form.required("category")?.trim().to_string(),
		condition: form.required("condition")?.trim().to_string(),
		location: form.required("location")?.trim().to_string(),
		contact_info: form.required("contact_info")?.trim().to_string(),
	})
}

pub fn parse_edit(form: &FormData) -> Result<MarketplaceEdit> {
	let listing = parse_new_item(form)?;
	Ok(MarketplaceEdit {
		name: listing.name,
		description: listing.description,
		price: listing.price,
		category: listing.category,
		condition: listing.condition,
		location: listing.location,
		contact_info: listing.contact_info,
		status: form.parse::<MarketplaceStatus>("status")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("12.50", Decimal::new(125, 1))]
	#[case(" 0 ", Decimal::ZERO)]
	#[case("-0", Decimal::ZERO)]
	#[case("300", Decimal::new(300, 0))]
	fn test_parse_price(#[case] raw: &str, #[case] expected: Decimal) {
		assert_eq!(parse_price(raw).unwrap(), expected);
	}

	#[rstest]
	#[case("-1")]
	#[case("ten")]
	#[case("")]
	fn test_parse_price_rejects(#[case] raw: &str) {
		match parse_price(raw) {
			Err(Error::Validation(message)) => assert_eq!(message, PRICE_MESSAGE),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[rstest]
	fn test_listing_contact_is_free_text() {
		let form = FormData::new()
			.with_field("name", "Desk lamp")
			.with_field("price", "12.50")
			.with_field("category", "Furniture")
			.with_field("condition", "Good")
			.with_field("location", "Hostel B")
			.with_field("contact_info", "room 12, ask for Sam");

		let listing = parse_new_item(&form).unwrap();

		assert_eq!(listing.contact_info, "room 12, ask for Sam");
		assert_eq!(listing.description, None);
	}

	#[rstest]
	fn test_edit_reads_status() {
		let form = FormData::new()
			.with_field("name", "Desk lamp")
			.with_field("price", "10")
			.with_field("category", "Furniture")
			.with_field("condition", "Good")
			.with_field("location", "Hostel B")
			.with_field("contact_info", "9876543210")
			.with_field("status", "sold");

		assert_eq!(parse_edit(&form).unwrap().status, MarketplaceStatus::Sold);
	}
}
