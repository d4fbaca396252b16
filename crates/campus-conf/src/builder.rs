//! Settings builder
//!
//! Loads every source, merges them from lowest to highest priority, and
//! deserializes the result.

use crate::profile::Profile;
use crate::sources::{ConfigSource, SourceError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		#[source]
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),
}

#[derive(Default)]
pub struct SettingsBuilder {
	profile: Profile,
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn profile(mut self, profile: Profile) -> Self {
		self.profile = profile;
		self
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	pub fn build(mut self) -> Result<MergedSettings, SettingsError> {
		// Stable: equal priorities keep insertion order.
		self.sources.sort_by_key(|s| s.priority());

		let mut merged = Value::Object(Map::new());
		for source in &self.sources {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!(source = %source.description(), keys = values.len(), "settings source loaded");
			merge(&mut merged, Value::Object(values.into_iter().collect()));
		}

		Ok(MergedSettings {
			profile: self.profile,
			values: merged,
		})
	}
}

/// Merge `incoming` into `target`. Objects merge key by key; anything else
/// replaces, coerced to the type already in `target` where possible.
fn merge(target: &mut Value, incoming: Value) {
	match (target, incoming) {
		(Value::Object(existing), Value::Object(incoming)) => {
			for (key, value) in incoming {
				match existing.get_mut(&key) {
					Some(slot) => merge(slot, value),
					None => {
						existing.insert(key, value);
					}
				}
			}
		}
		(slot, value) => *slot = coerce(slot, value),
	}
}

/// Environment variables carry no type. Convert `value` to match the shape
/// of `existing` so that `"587"` can fill a port and `12345` a password.
fn coerce(existing: &Value, value: Value) -> Value {
	match (existing, value) {
		(Value::String(_), Value::Number(n)) => Value::String(n.to_string()),
		(Value::String(_), Value::Bool(b)) => Value::String(b.to_string()),
		(Value::Bool(_), Value::String(s)) => match s.to_lowercase().as_str() {
			"1" | "yes" | "on" | "true" => Value::Bool(true),
			"0" | "no" | "off" | "false" => Value::Bool(false),
			_ => Value::String(s),
		},
		(Value::Bool(_), Value::Number(n)) if n.as_i64() == Some(0) || n.as_i64() == Some(1) => {
			Value::Bool(n.as_i64() == Some(1))
		}
		(Value::Number(_), Value::String(s)) => s
			.trim()
			.parse::<i64>()
			.map(|n| Value::Number(n.into()))
			.unwrap_or(Value::String(s)),
		(_, value) => value,
	}
}

/// Result of [`SettingsBuilder::build`].
#[derive(Debug, Clone)]
pub struct MergedSettings {
	profile: Profile,
	values: Value,
}

impl MergedSettings {
	pub fn profile(&self) -> &Profile {
		&self.profile
	}

	/// Value at a dotted path such as `"email.port"`.
	pub fn get(&self, path: &str) -> Option<&Value> {
		path.split('.')
			.try_fold(&self.values, |value, key| value.get(key))
	}

	pub fn as_value(&self) -> &Value {
		&self.values
	}

	pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, SettingsError> {
		Ok(serde_json::from_value(self.values)?)
	}
}
