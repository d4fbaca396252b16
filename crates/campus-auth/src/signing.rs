//! Signed, timestamped tokens
//!
//! A token is `base64url(payload:timestamp:hex(hmac))` where the HMAC-SHA256
//! covers the salt, the payload and the timestamp. The salt namespaces
//! tokens: one signed for `email-confirm` never validates under another
//! salt even with the same secret.

use crate::time_provider::TimeProvider;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Duration;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
	/// Signature is valid but the token is older than the allowed age.
	#[error("Signature expired")]
	Expired,
	/// Not a token we issued: bad encoding, bad layout or bad signature.
	#[error("Bad signature")]
	Invalid,
}

#[derive(Clone)]
pub struct TimestampSigner {
	secret_key: Vec<u8>,
	salt: String,
	clock: Arc<dyn TimeProvider>,
}

impl std::fmt::Debug for TimestampSigner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TimestampSigner")
			.field("salt", &self.salt)
			.finish_non_exhaustive()
	}
}

impl TimestampSigner {
	pub fn new(secret_key: &[u8], salt: impl Into<String>, clock: Arc<dyn TimeProvider>) -> Self {
		Self {
			secret_key: secret_key.to_vec(),
			salt: salt.into(),
			clock,
		}
	}

	fn compute_hmac(&self, payload: &str, timestamp: i64) -> HmacSha256 {
		let mut mac =
			HmacSha256::new_from_slice(&self.secret_key).expect("HMAC accepts any key length");
		mac.update(self.salt.as_bytes());
		mac.update(b":");
		mac.update(payload.as_bytes());
		mac.update(b":");
		mac.update(timestamp.to_string().as_bytes());
		mac
	}

	/// Sign `payload` with the current time.
	///
	/// # Examples
	///
	/// ```
	/// use campus_auth::{SystemTimeProvider, TimestampSigner};
	/// use chrono::Duration;
	/// use std::sync::Arc;
	///
	/// let signer = TimestampSigner::new(b"secret", "email-confirm", Arc::new(SystemTimeProvider));
	/// let token = signer.sign("alice@example.edu");
	///
	/// assert_eq!(
	///     signer.unsign(&token, Duration::hours(1)).unwrap(),
	///     "alice@example.edu"
	/// );
	/// ```
	pub fn sign(&self, payload: &str) -> String {
		let timestamp = self.clock.now().timestamp();
		let signature = hex::encode(self.compute_hmac(payload, timestamp).finalize().into_bytes());
		URL_SAFE_NO_PAD.encode(format!("{}:{}:{}", payload, timestamp, signature))
	}

	/// Verify `token` and return its payload if it is at most `max_age` old.
	///
	/// The signature is checked before the age, so a forged token is
	/// always [`SigningError::Invalid`] and never [`SigningError::Expired`].
	pub fn unsign(&self, token: &str, max_age: Duration) -> Result<String, SigningError> {
		let decoded = URL_SAFE_NO_PAD
			.decode(token.trim())
			.map_err(|_| SigningError::Invalid)?;
		let data = String::from_utf8(decoded).map_err(|_| SigningError::Invalid)?;

		// The payload may itself contain ':', so split from the right.
		let mut parts = data.rsplitn(3, ':');
		let (Some(signature), Some(timestamp), Some(payload)) = (parts.next(), parts.next(), parts.next())
		else {
			return Err(SigningError::Invalid);
		};

		let timestamp: i64 = timestamp.parse().map_err(|_| SigningError::Invalid)?;
		let provided = hex::decode(signature).map_err(|_| SigningError::Invalid)?;

		self.compute_hmac(payload, timestamp)
			.verify_slice(&provided)
			.map_err(|_| SigningError::Invalid)?;

		let age = self.clock.now().timestamp().saturating_sub(timestamp);
		if age > max_age.num_seconds() {
			return Err(SigningError::Expired);
		}

		Ok(payload.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::time_provider::MockTimeProvider;
	use rstest::{fixture, rstest};

	#[fixture]
	fn clock() -> MockTimeProvider {
		MockTimeProvider::default()
	}

	fn signer(clock: &MockTimeProvider, salt: &str) -> TimestampSigner {
		TimestampSigner::new(b"test-secret-key", salt, Arc::new(clock.clone()))
	}

	#[rstest]
	fn test_sign_and_unsign(clock: MockTimeProvider) {
		let signer = signer(&clock, "email-confirm");

		let token = signer.sign("bob@example.edu");

		assert_eq!(signer.unsign(&token, Duration::hours(1)).unwrap(), "bob@example.edu");
	}

	#[rstest]
	fn test_payload_with_colons(clock: MockTimeProvider) {
		let signer = signer(&clock, "email-confirm");

		let token = signer.sign("a:b:c");

		assert_eq!(signer.unsign(&token, Duration::hours(1)).unwrap(), "a:b:c");
	}

	#[rstest]
	#[case(Duration::seconds(3600), Ok("bob@example.edu".to_string()))]
	#[case(Duration::seconds(3601), Err(SigningError::Expired))]
	fn test_expiry_boundary(
		clock: MockTimeProvider,
		#[case] elapsed: Duration,
		#[case] expected: Result<String, SigningError>,
	) {
		// Arrange
		let signer = signer(&clock, "email-confirm");
		let token = signer.sign("bob@example.edu");

		// Act
		clock.advance(elapsed);
		let result = signer.unsign(&token, Duration::hours(1));

		// Assert
		assert_eq!(result, expected);
	}

	#[rstest]
	fn test_tampered_token_is_invalid(clock: MockTimeProvider) {
		// Arrange
		let signer = signer(&clock, "email-confirm");
		let token = signer.sign("bob@example.edu");
		let data = String::from_utf8(URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
		let forged = URL_SAFE_NO_PAD.encode(data.replacen("bob", "eve", 1));

		// Act
		let result = signer.unsign(&forged, Duration::hours(1));

		// Assert
		assert_eq!(result, Err(SigningError::Invalid));
	}

	#[rstest]
	fn test_forged_old_token_is_invalid_not_expired(clock: MockTimeProvider) {
		let signer = signer(&clock, "email-confirm");
		let forged = URL_SAFE_NO_PAD.encode("bob@example.edu:0:deadbeef");

		assert_eq!(
			signer.unsign(&forged, Duration::hours(1)),
			Err(SigningError::Invalid)
		);
	}

	#[rstest]
	fn test_salt_separates_namespaces(clock: MockTimeProvider) {
		let token = signer(&clock, "password-reset").sign("bob@example.edu");

		let result = signer(&clock, "email-confirm").unsign(&token, Duration::hours(1));

		assert_eq!(result, Err(SigningError::Invalid));
	}

	#[rstest]
	#[case("")]
	#[case("!!!not-base64")]
	#[case("bm9jb2xvbnM")]
	fn test_garbage_is_invalid(clock: MockTimeProvider, #[case] token: &str) {
		let signer = signer(&clock, "email-confirm");

		assert_eq!(
			signer.unsign(token, Duration::hours(1)),
			Err(SigningError::Invalid)
		);
	}
}
