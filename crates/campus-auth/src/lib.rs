//! # campus-auth
//!
//! Authentication building blocks for Campus Hub:
//!
//! - [`PasswordHasher`] / [`Argon2Hasher`] for credential storage
//! - [`SessionStore`] backends and the [`SessionMiddleware`] that exposes a
//!   [`Session`] to handlers
//! - [`AuthenticationMiddleware`] resolving a [`CurrentUser`] per request
//! - [`LoginRequired`] for routes that need an identity
//! - [`TimestampSigner`] for expiring signed tokens such as email
//!   confirmation links
//! - the registration rate-limit cookie in [`rate_limit`]

pub mod current_user;
pub mod hasher;
pub mod login_required;
pub mod middleware;
pub mod rate_limit;
pub mod session;
pub mod signing;
pub mod time_provider;

pub use current_user::{AuthUser, CurrentUser};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use login_required::{LOGIN_URL, LoginRequired, is_safe_next, login_required};
pub use middleware::{
	AuthenticationBackend, AuthenticationMiddleware, RequestSessionExt, SESSION_COOKIE_NAME,
	Session, SessionMiddleware,
};
pub use session::{
	FileSessionStore, InMemorySessionStore, SessionData, SessionError, SessionId, SessionStore,
};
pub use signing::{SigningError, TimestampSigner};
pub use time_provider::{MockTimeProvider, SystemTimeProvider, TimeProvider};
