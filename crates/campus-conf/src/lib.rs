//! # campus-conf
//!
//! Layered settings for Campus Hub.
//!
//! Values are merged from several [`ConfigSource`]s in priority order,
//! lowest first:
//!
//! 1. built-in defaults ([`settings::default_values`])
//! 2. `settings/base.toml`, then `settings/<profile>.toml`
//! 3. environment variables prefixed `CAMPUS_`, with `__` separating
//!    nested keys (`CAMPUS_DATABASE__URL` sets `database.url`)
//!
//! The profile comes from `CAMPUS_ENV` and defaults to `local`.
//!
//! ## Example
//!
//! ```rust
//! use campus_conf::{DefaultSource, Settings, SettingsBuilder, Profile};
//!
//! let settings: Settings = SettingsBuilder::new()
//!     .profile(Profile::Local)
//!     .add_source(DefaultSource::from_value(campus_conf::settings::default_values()))
//!     .build()
//!     .unwrap()
//!     .into_typed()
//!     .unwrap();
//!
//! assert_eq!(settings.storage.lostfound_bucket, "lostfound");
//! ```

pub mod builder;
pub mod profile;
pub mod settings;
pub mod sources;

pub use builder::{MergedSettings, SettingsBuilder, SettingsError};
pub use profile::Profile;
pub use settings::{
	DatabaseSettings, EmailBackendKind, EmailSettings, SecuritySettings, ServerSettings,
	SessionBackendKind, SessionSettings, Settings, StorageBackendKind, StorageSettings,
};
pub use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};
