use super::models::User;
use super::views;
use crate::state::AppState;
use campus_auth::login_required;
use campus_core::Result;
use campus_urls::{Router, handler_fn};
use std::sync::Arc;

pub use campus_auth::LOGIN_URL;

pub const PREFIX: &str = "/auth";
pub const REGISTER_URL: &str = "/auth/register";
pub const PROFILE_URL: &str = "/auth/profile";

/// Site path of the confirmation link for `token`.
pub fn confirm_path(token: &str) -> String {
	format!("{}/confirm/{}", PREFIX, token)
}

/// Routes relative to [`PREFIX`].
pub fn url_patterns(state: Arc<AppState>) -> Result<Router> {
	Router::new()
		.get_post("/login", handler_fn(state.clone(), views::login))?
		.get("/continue_without_login", handler_fn(state.clone(), views::continue_without_login))?
		.get_post("/register", handler_fn(state.clone(), views::register))?
		.get("/confirm/<token>", handler_fn(state.clone(), views::confirm_email))?
		.get("/logout", login_required::<User>(handler_fn(state.clone(), views::logout)))?
		.get_post("/profile", login_required::<User>(handler_fn(state.clone(), views::profile)))?
		.post(
			"/update_profile",
			login_required::<User>(handler_fn(state, views::update_profile)),
		)
}
