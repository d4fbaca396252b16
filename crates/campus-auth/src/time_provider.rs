//! Injectable wall clock
//!
//! Token expiry and the registration rate limit read the time through
//! [`TimeProvider`] so tests can move the clock instead of sleeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

pub trait TimeProvider: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
	pub fn new() -> Self {
		Self
	}
}

impl TimeProvider for SystemTimeProvider {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
	current_time: Arc<RwLock<DateTime<Utc>>>,
}

impl MockTimeProvider {
	pub fn new(start_time: DateTime<Utc>) -> Self {
		Self {
			current_time: Arc::new(RwLock::new(start_time)),
		}
	}

	pub fn advance(&self, duration: Duration) {
		let mut time = self.current_time.write();
		*time += duration;
	}

	pub fn set_time(&self, time: DateTime<Utc>) {
		*self.current_time.write() = time;
	}
}

impl Default for MockTimeProvider {
	fn default() -> Self {
		Self::new(Utc::now())
	}
}

impl TimeProvider for MockTimeProvider {
	fn now(&self) -> DateTime<Utc> {
		*self.current_time.read()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_mock_advance_is_shared_between_clones() {
		// Arrange
		let start = Utc::now();
		let clock = MockTimeProvider::new(start);
		let clone = clock.clone();

		// Act
		clone.advance(Duration::seconds(61));

		// Assert
		assert_eq!(clock.now() - start, Duration::seconds(61));
	}
}
