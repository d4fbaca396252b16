//! Form field validators
//!
//! These validators run before any mutation. A failure is reported as
//! [`Error::Validation`] carrying the user-facing message.
//!
//! # Examples
//!
//! ```
//! use campus_core::validators::{secure_filename, validate_image_filename};
//!
//! assert!(validate_image_filename("photo.JPG").is_ok());
//! assert!(validate_image_filename("notes.pdf").is_err());
//! assert_eq!(secure_filename("../my photo.png"), "my_photo.png");
//! ```

use crate::exception::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// File extensions accepted for item images, lowercase.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Maximum image dimensions (width, height) advertised to upload forms.
pub const MAX_IMAGE_SIZE: (u32, u32) = (1280, 720);

pub const CONTACT_INFO_MESSAGE: &str = "Contact info must be a 10-digit phone number";

pub const INVALID_IMAGE_MESSAGE: &str =
	"Invalid file format. Only JPG, PNG, JPEG and WEBP are allowed.";

static CONTACT_INFO_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("static regex is valid"));

/// Validate a contact number: exactly ten ASCII digits once surrounding
/// whitespace is removed. Returns the trimmed value.
pub fn validate_contact_info(value: &str) -> Result<String> {
	let trimmed = value.trim();
	if CONTACT_INFO_RE.is_match(trimmed) {
		Ok(trimmed.to_string())
	} else {
		Err(Error::Validation(CONTACT_INFO_MESSAGE.to_string()))
	}
}

/// Lowercased extension of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
	let (stem, ext) = filename.rsplit_once('.')?;
	if stem.is_empty() && ext.is_empty() {
		return None;
	}
	Some(ext.to_ascii_lowercase())
}

pub fn is_allowed_image(filename: &str) -> bool {
	file_extension(filename)
		.map(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
		.unwrap_or(false)
}

pub fn validate_image_filename(filename: &str) -> Result<()> {
	if is_allowed_image(filename) {
		Ok(())
	} else {
		Err(Error::Validation(INVALID_IMAGE_MESSAGE.to_string()))
	}
}

/// Reduce a client supplied filename to a safe ASCII name.
///
/// Path components are dropped, whitespace becomes `_`, and anything other
/// than ASCII alphanumerics, `.`, `-` and `_` is removed. Leading dots and
/// underscores are stripped so the result can never be a hidden file or a
/// relative path.
pub fn secure_filename(filename: &str) -> String {
	let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

	let cleaned: String = base
		.split_whitespace()
		.collect::<Vec<_>>()
		.join("_")
		.chars()
		.filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
		.collect();

	cleaned.trim_start_matches(['.', '_']).to_string()
}
