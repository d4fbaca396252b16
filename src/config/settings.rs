//! Settings for the running project
//!
//! TOML files are read from `settings/` under the working directory unless
//! `CAMPUS_SETTINGS_DIR` points elsewhere. The profile comes from
//! `CAMPUS_ENV`.

use campus_conf::{Settings, SettingsError};
use std::env;
use std::path::PathBuf;

pub const SETTINGS_DIR_VAR: &str = "CAMPUS_SETTINGS_DIR";

pub fn settings_dir() -> PathBuf {
	match env::var_os(SETTINGS_DIR_VAR) {
		Some(dir) => PathBuf::from(dir),
		None => PathBuf::from("settings"),
	}
}

pub fn get_settings() -> Result<Settings, SettingsError> {
	let dir = settings_dir();
	tracing::debug!(dir = %dir.display(), "loading settings");
	Settings::load(dir)
}
