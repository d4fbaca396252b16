use super::views;
use crate::apps::accounts::models::User;
use crate::state::AppState;
use campus_auth::login_required;
use campus_core::Result;
use campus_urls::{Router, handler_fn};
use std::sync::Arc;

pub const PREFIX: &str = "/lost-and-found";
pub const DASHBOARD_URL: &str = "/lost-and-found/";
pub const NEW_URL: &str = "/lost-and-found/new";

pub fn detail_url(id: i64) -> String {
	format!("{}/item/{}", PREFIX, id)
}

pub fn edit_url(id: i64) -> String {
	format!("{}/edit/{}", PREFIX, id)
}

/// Routes relative to [`PREFIX`]. All of them require a login.
pub fn url_patterns(state: Arc<AppState>) -> Result<Router> {
	let auth = |handler| login_required::<User>(handler);

	Router::new()
		.get("/", auth(handler_fn(state.clone(), views::dashboard)))?
		.get("/item/<int:id>", auth(handler_fn(state.clone(), views::item_detail)))?
		.get_post("/new", auth(handler_fn(state.clone(), views::report)))?
		.get_post("/edit/<int:id>", auth(handler_fn(state.clone(), views::edit_item)))?
		.post("/delete/<int:id>", auth(handler_fn(state.clone(), views::delete_item)))?
		.post("/item/<int:id>/claim", auth(handler_fn(state.clone(), views::claim_item)))?
		.post("/item/<int:id>/found_user", auth(handler_fn(state.clone(), views::found_user)))?
		.post("/item/<int:id>/remove_claim", auth(handler_fn(state.clone(), views::remove_claim)))?
		.post("/item/<int:id>/remove_found", auth(handler_fn(state, views::remove_found)))
}
