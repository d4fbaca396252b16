//! Marketplace pages and actions. All handlers require a login.

use super::forms::{CREATE_IMAGE_FIELD, EDIT_IMAGE_FIELD, parse_edit, parse_new_item};
use super::models::{MarketplaceItem, MarketplaceStatus};
use super::repository;
use super::urls::{DASHBOARD_URL, NEW_URL, detail_url, edit_url};
use crate::apps::accounts::models::User;
use crate::apps::accounts::repository as users;
use crate::apps::accounts::urls::REGISTER_URL;
use crate::apps::catalog::{self, Category};
use crate::apps::items::{
	Actor, ImageOwner, ItemImage, ItemKind, WithImages, images_for, images_for_items, upload_image, with_images,
};
use crate::shortcuts::{redirect_on_error, redirect_with, render_json, require_user};
use crate::state::AppState;
use campus_core::validators::{INVALID_IMAGE_MESSAGE, MAX_IMAGE_SIZE};
use campus_core::{Error, Message, Result};
use campus_http::{Request, Response};
use hyper::Method;
use serde::Serialize;
use std::sync::Arc;

const RECENT_LIMIT: usize = 10;
const NOT_AVAILABLE: &str = "N/A";

#[derive(Serialize)]
struct DashboardContext {
	user: User,
	items: Vec<WithImages<MarketplaceItem>>,
	total_items: usize,
	total_available: usize,
	total_sold: usize,
	recent_items: Vec<WithImages<MarketplaceItem>>,
	categories: Vec<Category>,
}

#[derive(Serialize)]
struct DetailContext {
	user: User,
	item: MarketplaceItem,
	images: Vec<ItemImage>,
	feedback: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct FormContext {
	categories: Vec<Category>,
	max_image_size: (u32, u32),
	#[serde(skip_serializing_if = "Option::is_none")]
	item: Option<MarketplaceItem>,
	#[serde(skip_serializing_if = "Option::is_none")]
	images: Option<Vec<ItemImage>>,
}

pub async fn dashboard(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;

	let items = repository::list(&state.pool).await?;
	let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
	let images = images_for_items(&state.pool, ItemKind::Marketplace, &ids).await?;

	let count = |status: MarketplaceStatus| items.iter().filter(|i| i.status() == status).count();
	let total_available = count(MarketplaceStatus::Available);
	let total_sold = count(MarketplaceStatus::Sold);
	let total_items = items.len();

	let recent: Vec<MarketplaceItem> = items.iter().take(RECENT_LIMIT).cloned().collect();
	let context = DashboardContext {
		user,
		items: with_images(items, |i| i.id, &images),
		total_items,
		total_available,
		total_sold,
		recent_items: with_images(recent, |i| i.id, &images),
		categories: catalog::list_by_kind(&state.pool, ItemKind::Marketplace).await?,
	};
	render_json(&request, &context)
}

pub async fn item_detail(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;

	repository::increment_views(&state.pool, id).await?;
	let item = match repository::get(&state.pool, id).await {
		Ok(item) => item,
		Err(err) => return redirect_on_error(&request, err, DASHBOARD_URL),
	};

	let context = DetailContext {
		user,
		images: images_for(&state.pool, ImageOwner::marketplace(item.id)).await?,
		item,
		feedback: Vec::new(),
	};
	render_json(&request, &context)
}

/// `GET/POST /marketplace/new`
pub async fn create(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	if user.is_guest() {
		return Ok(redirect_with(
			&request,
			Message::warning("You need to create an account to list items for sale"),
			REGISTER_URL,
		));
	}

	if request.method != Method::POST {
		let context = FormContext {
			categories: catalog::list_by_kind(&state.pool, ItemKind::Marketplace).await?,
			max_image_size: MAX_IMAGE_SIZE,
			item: None,
			images: None,
		};
		return render_json(&request, &context);
	}

	match submit_listing(&state, &request, &user).await {
		Ok(_) => Ok(redirect_with(
			&request,
			Message::success("Item listed successfully!"),
			DASHBOARD_URL,
		)),
		Err(err) => redirect_on_error(&request, err, NEW_URL),
	}
}

async fn submit_listing(state: &AppState, request: &Request, user: &User) -> Result<MarketplaceItem> {
	let form = request.form().await?;
	let listing = parse_new_item(&form)?;
	let file = form
		.file(CREATE_IMAGE_FIELD)
		.ok_or_else(|| Error::Validation(INVALID_IMAGE_MESSAGE.to_string()))?;

	let image_url = upload_image(state.media.as_ref(), state.bucket(ItemKind::Marketplace), file).await?;
	repository::create(&state.pool, &listing, user.id, &image_url, state.now()).await
}

/// `GET/POST /marketplace/edit/<id>`
pub async fn edit_item(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;
	let actor = Actor::from(&user);

	let mut item = match repository::get(&state.pool, id).await {
		Ok(item) => item,
		Err(err) => return redirect_on_error(&request, err, DASHBOARD_URL),
	};
	if let Err(refused) = item.authorize_manage(actor, "You are not authorized to edit this item") {
		return Ok(redirect_with(&request, refused.flash(), DASHBOARD_URL));
	}

	if request.method != Method::POST {
		let context = FormContext {
			categories: catalog::list_by_kind(&state.pool, ItemKind::Marketplace).await?,
			max_image_size: MAX_IMAGE_SIZE,
			images: Some(images_for(&state.pool, ImageOwner::marketplace(id)).await?),
			item: Some(item),
		};
		return render_json(&request, &context);
	}

	match submit_edit(&state, &request, actor, &mut item).await {
		Ok(()) => Ok(redirect_with(
			&request,
			Message::success("Item updated successfully!"),
			detail_url(id),
		)),
		Err(err) => redirect_on_error(&request, err, edit_url(id)),
	}
}

async fn submit_edit(state: &AppState, request: &Request, actor: Actor, item: &mut MarketplaceItem) -> Result<()> {
	let form = request.form().await?;
	let edit = parse_edit(&form)?;
	let new_image = match form.file(EDIT_IMAGE_FIELD) {
		Some(file) => Some(upload_image(state.media.as_ref(), state.bucket(ItemKind::Marketplace), file).await?),
		None => None,
	};

	item.apply_edit(actor, edit)?;
	repository::save(&state.pool, item, new_image.as_deref(), state.now()).await?;
	tracing::info!(item_id = item.id, user_id = actor.user_id, "marketplace listing edited");
	Ok(())
}

/// `POST /marketplace/delete/<id>`
pub async fn delete_item(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;

	let mut item = match repository::get(&state.pool, id).await {
		Ok(item) => item,
		Err(err) => return redirect_on_error(&request, err, DASHBOARD_URL),
	};
	if let Err(refused) = item.soft_delete(Actor::from(&user)) {
		return Ok(redirect_with(&request, refused.flash(), DASHBOARD_URL));
	}
	repository::save(&state.pool, &item, None, state.now()).await?;

	tracing::info!(item_id = id, user_id = user.id, "marketplace listing deleted");
	Ok(redirect_with(&request, Message::success("Item deleted successfully!"), DASHBOARD_URL))
}

/// `GET /marketplace/buy/<id>`: marks the listing sold and hands the buyer
/// the seller's contact details as a text file.
pub async fn buy_item(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;

	let mut item = match repository::get(&state.pool, id).await {
		Ok(item) => item,
		Err(err) => return redirect_on_error(&request, err, DASHBOARD_URL),
	};
	if let Err(refused) = item.buy(Actor::from(&user)) {
		return Ok(redirect_with(&request, refused.flash(), detail_url(id)));
	}
	repository::save(&state.pool, &item, None, state.now()).await?;

	let seller = users::find_by_id(&state.pool, item.user_id).await?;
	tracing::info!(item_id = id, buyer_id = user.id, seller_id = item.user_id, "marketplace listing bought");
	Ok(Response::attachment(
		seller_details(&item, seller.as_ref()),
		&format!("seller_{}.txt", item.id),
	))
}

fn seller_details(item: &MarketplaceItem, seller: Option<&User>) -> String {
	let username = seller.map(|s| s.username.as_str()).unwrap_or(NOT_AVAILABLE);
	let email = seller.map(|s| s.email.as_str()).unwrap_or(NOT_AVAILABLE);
	[
		format!("Seller Details for Item: {}", item.name),
		format!("Username: {}", username),
		format!("Email: {}", email),
		format!("Contact: {}", item.contact_info.as_deref().unwrap_or_default()),
	]
	.join("\n")
}
