use campus_core::{Error, Result};

/// Password hasher trait
///
/// # Examples
///
/// ```
/// use campus_auth::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new();
/// let hash = hasher.hash("correct horse").unwrap();
///
/// assert!(hasher.verify("correct horse", &hash).unwrap());
/// assert!(!hasher.verify("battery staple", &hash).unwrap());
/// ```
pub trait PasswordHasher: Send + Sync {
	/// Hash a plaintext password into a self-describing string.
	fn hash(&self, password: &str) -> Result<String>;

	/// `Ok(false)` on mismatch. An error means `hash` could not be parsed.
	fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id password hasher producing PHC strings.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
	pub fn new() -> Self {
		Self
	}
}

impl PasswordHasher for Argon2Hasher {
	fn hash(&self, password: &str) -> Result<String> {
		use argon2::{
			Argon2,
			password_hash::{PasswordHasher as _, SaltString},
		};
		use rand::RngCore;

		let mut salt_bytes = [0u8; 16];
		rand::thread_rng().fill_bytes(&mut salt_bytes);

		let salt = SaltString::encode_b64(&salt_bytes)
			.map_err(|e| Error::Internal(format!("Failed to encode salt: {}", e)))?;

		Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		use argon2::{
			Argon2,
			password_hash::{PasswordHash, PasswordVerifier},
		};

		let parsed_hash = PasswordHash::new(hash)
			.map_err(|e| Error::Internal(format!("Stored password hash is malformed: {}", e)))?;

		Ok(Argon2::default()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_hash_is_salted() {
		// Arrange
		let hasher = Argon2Hasher::new();

		// Act
		let first = hasher.hash("secret").unwrap();
		let second = hasher.hash("secret").unwrap();

		// Assert
		assert_ne!(first, second);
		assert!(first.starts_with("$argon2id$"));
		assert!(hasher.verify("secret", &second).unwrap());
	}

	#[rstest]
	fn test_verify_rejects_wrong_password() {
		let hasher = Argon2Hasher::new();
		let hash = hasher.hash("secret").unwrap();

		assert!(!hasher.verify("Secret", &hash).unwrap());
	}

	#[rstest]
	fn test_verify_malformed_hash_is_error() {
		let hasher = Argon2Hasher::new();

		assert!(hasher.verify("secret", "plaintext").is_err());
	}
}
