//! Configuration sources for layered settings
//!
//! Sources are merged in priority order: environment variables > TOML
//! files > defaults.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

/// Separator for nested keys in environment variable names.
pub const NESTING_SEPARATOR: &str = "__";

pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Priority of this source (higher = more important)
	fn priority(&self) -> u8;

	fn description(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variable configuration source.
///
/// With prefix `CAMPUS_`, `CAMPUS_EMAIL__PORT=2525` loads as
/// `{"email": {"port": 2525}}`. Keys are lowercased.
pub struct EnvSource {
	prefix: Option<String>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Only load variables starting with `prefix`, and strip it.
	///
	/// # Examples
	///
	/// ```
	/// use campus_conf::EnvSource;
	///
	/// let source = EnvSource::new().with_prefix("CAMPUS_");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	fn load_from(&self, vars: impl IntoIterator<Item = (String, String)>) -> IndexMap<String, Value> {
		let mut config = IndexMap::new();

		for (key, value) in vars {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest.to_string(),
					None => continue,
				},
				None => key,
			};
			if clean_key.is_empty() {
				continue;
			}

			let path: Vec<String> = clean_key
				.to_lowercase()
				.split(NESTING_SEPARATOR)
				.map(str::to_string)
				.collect();
			if path.iter().any(String::is_empty) {
				continue;
			}
			insert_path(&mut config, &path, parse_env_value(&value));
		}

		config
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

/// Parse an environment value as an integer, then a boolean, then a string.
fn parse_env_value(value: &str) -> Value {
	if let Ok(num) = value.parse::<i64>() {
		Value::Number(num.into())
	} else if let Ok(b) = value.parse::<bool>() {
		Value::Bool(b)
	} else {
		Value::String(value.to_string())
	}
}

fn insert_path(config: &mut IndexMap<String, Value>, path: &[String], value: Value) {
	let Some((first, rest)) = path.split_first() else {
		return;
	};
	if rest.is_empty() {
		config.insert(first.clone(), value);
		return;
	}

	let entry = config
		.entry(first.clone())
		.or_insert_with(|| Value::Object(Map::new()));
	if !entry.is_object() {
		*entry = Value::Object(Map::new());
	}
	let mut current = entry;
	for (i, segment) in rest.iter().enumerate() {
		let Value::Object(map) = current else {
			return;
		};
		if i == rest.len() - 1 {
			map.insert(segment.clone(), value);
			return;
		}
		current = map
			.entry(segment.clone())
			.or_insert_with(|| Value::Object(Map::new()));
		if !current.is_object() {
			*current = Value::Object(Map::new());
		}
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.load_from(std::env::vars()))
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

/// TOML file configuration source. A missing file loads as empty.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected object at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	/// Defaults taken from the top level of a JSON object. Non-objects
	/// give an empty source.
	pub fn from_value(value: Value) -> Self {
		let values = match value {
			Value::Object(map) => map.into_iter().collect(),
			_ => IndexMap::new(),
		};
		Self { values }
	}

	/// # Examples
	///
	/// ```
	/// use campus_conf::DefaultSource;
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new()
	///     .with_value("log_level", Value::String("debug".to_string()));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;
	use tempfile::TempDir;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_env_source_nests_and_filters() {
		// Arrange
		let source = EnvSource::new().with_prefix("CAMPUS_");

		// Act
		let config = source.load_from(vars(&[
			("CAMPUS_DATABASE__URL", "sqlite::memory:"),
			("CAMPUS_EMAIL__PORT", "2525"),
			("CAMPUS_EMAIL__USE_TLS", "false"),
			("CAMPUS_LOG_LEVEL", "debug"),
			("HOME", "/root"),
		]));

		// Assert
		assert_eq!(config["database"], json!({"url": "sqlite::memory:"}));
		assert_eq!(config["email"], json!({"port": 2525, "use_tls": false}));
		assert_eq!(config["log_level"], json!("debug"));
		assert!(!config.contains_key("home"));
	}

	#[rstest]
	#[case("CAMPUS___URL")]
	#[case("CAMPUS_DATABASE__")]
	#[case("CAMPUS_")]
	fn test_env_source_skips_malformed_keys(#[case] key: &str) {
		let source = EnvSource::new().with_prefix("CAMPUS_");

		let config = source.load_from(vars(&[(key, "x")]));

		assert!(config.is_empty());
	}

	#[rstest]
	fn test_toml_source() {
		// Arrange
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("base.toml");
		let mut file = fs::File::create(&path).unwrap();
		writeln!(
			file,
			r#"
log_level = "warn"

[storage]
lostfound_bucket = "lf-images"
"#
		)
		.unwrap();

		// Act
		let config = TomlFileSource::new(&path).load().unwrap();

		// Assert
		assert_eq!(config["log_level"], json!("warn"));
		assert_eq!(config["storage"], json!({"lostfound_bucket": "lf-images"}));
	}

	#[rstest]
	fn test_toml_source_missing_file_is_empty() {
		let config = TomlFileSource::new("/nonexistent/settings/production.toml")
			.load()
			.unwrap();

		assert!(config.is_empty());
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(EnvSource::new().priority(), 100);
		assert_eq!(TomlFileSource::new("base.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
	}
}
