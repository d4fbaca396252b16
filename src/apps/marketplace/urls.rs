use super::views;
use crate::apps::accounts::models::User;
use crate::state::AppState;
use campus_auth::login_required;
use campus_core::Result;
use campus_urls::{Router, handler_fn};
use std::sync::Arc;

pub const PREFIX: &str = "/marketplace";
pub const DASHBOARD_URL: &str = "/marketplace/";
pub const NEW_URL: &str = "/marketplace/new";

pub fn detail_url(id: i64) -> String {
	format!("{}/item/{}", PREFIX, id)
}

pub fn edit_url(id: i64) -> String {
	format!("{}/edit/{}", PREFIX, id)
}

pub fn buy_url(id: i64) -> String {
	format!("{}/buy/{}", PREFIX, id)
}

pub fn url_patterns(state: Arc<AppState>) -> Result<Router> {
	let auth = |handler| login_required::<User>(handler);

	Router::new()
		.get("/", auth(handler_fn(state.clone(), views::dashboard)))?
		.get("/item/<int:id>", auth(handler_fn(state.clone(), views::item_detail)))?
		.get_post("/new", auth(handler_fn(state.clone(), views::create)))?
		.get_post("/edit/<int:id>", auth(handler_fn(state.clone(), views::edit_item)))?
		.post("/delete/<int:id>", auth(handler_fn(state.clone(), views::delete_item)))?
		.get("/buy/<int:id>", auth(handler_fn(state, views::buy_item)))
}
