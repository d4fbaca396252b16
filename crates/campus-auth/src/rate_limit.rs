//! Client-held registration rate limit
//!
//! The client is given a `rate_limit` cookie holding the time of its last
//! successful registration. A client that drops the cookie is not limited.

use campus_http::SetCookie;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

pub const RATE_LIMIT_COOKIE: &str = "rate_limit";

pub const RATE_LIMIT_WINDOW_SECS: i64 = 60;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
	at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a cookie value written by [`rate_limit_cookie`].
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
	NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
		.ok()
		.map(|naive| naive.and_utc())
}

/// Whether a request carrying `cookie` at `now` falls inside the window.
/// Missing or unparsable cookies never limit.
pub fn is_rate_limited(cookie: Option<&str>, now: DateTime<Utc>) -> bool {
	cookie
		.and_then(parse_timestamp)
		.map(|last| now - last < Duration::seconds(RATE_LIMIT_WINDOW_SECS))
		.unwrap_or(false)
}

pub fn rate_limit_cookie(now: DateTime<Utc>) -> SetCookie {
	SetCookie::new(RATE_LIMIT_COOKIE, format_timestamp(now)).max_age(RATE_LIMIT_WINDOW_SECS)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use rstest::rstest;

	fn at(secs: i64) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
	}

	#[rstest]
	#[case(Some("2024-09-01 12:00:00"), 59, true)]
	#[case(Some("2024-09-01 12:00:00"), 60, false)]
	#[case(Some("2024-09-01 12:00:00"), 3600, false)]
	#[case(Some("not a date"), 1, false)]
	#[case(None, 1, false)]
	fn test_is_rate_limited(#[case] cookie: Option<&str>, #[case] offset: i64, #[case] expected: bool) {
		assert_eq!(is_rate_limited(cookie, at(offset)), expected);
	}

	#[rstest]
	fn test_cookie_roundtrip() {
		// Arrange
		let now = at(0);

		// Act
		let cookie = rate_limit_cookie(now);

		// Assert
		assert_eq!(cookie.name(), RATE_LIMIT_COOKIE);
		assert_eq!(parse_timestamp(cookie.value()), Some(now));
		assert!(cookie.to_header_value().contains("Max-Age=60"));
	}
}
