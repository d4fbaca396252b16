//! Deployment profile

use std::env;
use std::fmt;

pub const PROFILE_ENV_VAR: &str = "CAMPUS_ENV";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Profile {
	#[default]
	Local,
	Development,
	Staging,
	Production,
	Test,
	Custom(String),
}

impl Profile {
	/// Parse a profile name. Unknown names become [`Profile::Custom`].
	pub fn parse(name: &str) -> Self {
		match name.trim().to_lowercase().as_str() {
			"" | "local" => Profile::Local,
			"dev" | "development" => Profile::Development,
			"staging" => Profile::Staging,
			"prod" | "production" => Profile::Production,
			"test" | "testing" => Profile::Test,
			other => Profile::Custom(other.to_string()),
		}
	}

	/// Profile named by `CAMPUS_ENV`, or [`Profile::Local`].
	pub fn from_env() -> Self {
		env::var(PROFILE_ENV_VAR)
			.map(|v| Self::parse(&v))
			.unwrap_or_default()
	}

	pub fn as_str(&self) -> &str {
		match self {
			Profile::Local => "local",
			Profile::Development => "development",
			Profile::Staging => "staging",
			Profile::Production => "production",
			Profile::Test => "test",
			Profile::Custom(name) => name,
		}
	}

	pub fn is_production(&self) -> bool {
		matches!(self, Profile::Production)
	}

	/// File holding this profile's overrides, e.g. `production.toml`.
	pub fn settings_file_name(&self) -> String {
		format!("{}.toml", self.as_str())
	}
}

impl fmt::Display for Profile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
