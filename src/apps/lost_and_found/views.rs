//! Lost & found pages and actions
//!
//! Every handler sits behind `login_required`. Refused actions are
//! reported with a flash message and a redirect; only server-side failures
//! propagate as errors.

use super::forms::{CREATE_IMAGE_FIELD, EDIT_IMAGE_FIELD, parse_edit, parse_new_item};
use super::models::{LostFoundItem, LostFoundStatus};
use super::repository::{self, Ordering};
use super::urls::{DASHBOARD_URL, NEW_URL, detail_url, edit_url};
use crate::apps::accounts::models::User;
use crate::apps::accounts::repository as users;
use crate::apps::accounts::urls::REGISTER_URL;
use crate::apps::catalog::{self, Category};
use crate::apps::items::{
	Actor, ImageOwner, ItemImage, ItemKind, LifecycleError, WithImages, images_for, images_for_items, upload_image,
	with_images,
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

#[derive(Serialize)]
struct DashboardContext {
	user: User,
	items: Vec<WithImages<LostFoundItem>>,
	total_items: usize,
	total_lost: usize,
	total_found: usize,
	recent_items: Vec<WithImages<LostFoundItem>>,
	categories: Vec<Category>,
}

#[derive(Serialize)]
struct DetailContext {
	user: User,
	item: LostFoundItem,
	images: Vec<ItemImage>,
	found_by_user: Option<String>,
	claimed_by_user: Option<String>,
	feedback: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct FormContext {
	categories: Vec<Category>,
	max_image_size: (u32, u32),
	#[serde(skip_serializing_if = "Option::is_none")]
	item: Option<LostFoundItem>,
	#[serde(skip_serializing_if = "Option::is_none")]
	images: Option<Vec<ItemImage>>,
}

pub async fn dashboard(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;

	let items = repository::list(&state.pool, Ordering::DateDesc).await?;
	let by_priority = repository::list(&state.pool, Ordering::PriorityDesc).await?;
	let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
	let images = images_for_items(&state.pool, ItemKind::LostFound, &ids).await?;

	let count = |status: LostFoundStatus| items.iter().filter(|i| i.status() == status).count();
	let total_lost = count(LostFoundStatus::Lost);
	let total_found = count(LostFoundStatus::Found);
	let total_items = items.len();

	let recent: Vec<LostFoundItem> = by_priority.into_iter().take(RECENT_LIMIT).collect();
	let context = DashboardContext {
		user,
		items: with_images(items, |i| i.id, &images),
		total_items,
		total_lost,
		total_found,
		recent_items: with_images(recent, |i| i.id, &images),
		categories: catalog::list_by_kind(&state.pool, ItemKind::LostFound).await?,
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

	let found_by_user = username_of(&state, item.found_by()).await?;
	let claimed_by_user = username_of(&state, item.claimed_by()).await?;
	let context = DetailContext {
		user,
		images: images_for(&state.pool, ImageOwner::lost_found(item.id)).await?,
		item,
		found_by_user,
		claimed_by_user,
		feedback: Vec::new(),
	};
	render_json(&request, &context)
}

async fn username_of(state: &AppState, user_id: Option<i64>) -> Result<Option<String>> {
	match user_id {
		Some(id) => Ok(users::find_by_id(&state.pool, id).await?.map(|u| u.username)),
		None => Ok(None),
	}
}

/// `GET/POST /lost-and-found/new`
pub async fn report(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	if user.is_guest() {
		return Ok(redirect_with(
			&request,
			Message::warning("You need to create an account to report items"),
			REGISTER_URL,
		));
	}

	if request.method != Method::POST {
		let context = FormContext {
			categories: catalog::list_by_kind(&state.pool, ItemKind::LostFound).await?,
			max_image_size: MAX_IMAGE_SIZE,
			item: None,
			images: None,
		};
		return render_json(&request, &context);
	}

	match submit_report(&state, &request, &user).await {
		Ok(_) => Ok(redirect_with(
			&request,
			Message::success("Report submitted successfully!"),
			DASHBOARD_URL,
		)),
		Err(err) => redirect_on_error(&request, err, NEW_URL),
	}
}

async fn submit_report(state: &AppState, request: &Request, user: &User) -> Result<LostFoundItem> {
	let form = request.form().await?;
	let new_item = parse_new_item(&form, state.now())?;
	let file = form
		.file(CREATE_IMAGE_FIELD)
		.ok_or_else(|| Error::Validation(INVALID_IMAGE_MESSAGE.to_string()))?;

	let image_url = upload_image(state.media.as_ref(), state.bucket(ItemKind::LostFound), file).await?;
	repository::create(&state.pool, &new_item, user.id, &image_url, state.now()).await
}

/// `GET/POST /lost-and-found/edit/<id>`
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
			categories: catalog::list_by_kind(&state.pool, ItemKind::LostFound).await?,
			max_image_size: MAX_IMAGE_SIZE,
			images: Some(images_for(&state.pool, ImageOwner::lost_found(id)).await?),
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

async fn submit_edit(state: &AppState, request: &Request, actor: Actor, item: &mut LostFoundItem) -> Result<()> {
	let form = request.form().await?;
	let edit = parse_edit(&form)?;
	let new_image = match form.file(EDIT_IMAGE_FIELD) {
		Some(file) => Some(upload_image(state.media.as_ref(), state.bucket(ItemKind::LostFound), file).await?),
		None => None,
	};

	item.apply_edit(actor, edit)?;
	repository::save(&state.pool, item, new_image.as_deref(), state.now()).await?;
	tracing::info!(item_id = item.id, user_id = actor.user_id, "lost & found item edited");
	Ok(())
}

/// `POST /lost-and-found/delete/<id>`
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

	tracing::info!(item_id = id, user_id = user.id, "lost & found item deleted");
	Ok(redirect_with(&request, Message::success("Item deleted successfully!"), DASHBOARD_URL))
}

/// Load a live item for a status transition. A missing item is reported
/// the same way as a transition from the wrong status.
async fn load_for_transition(state: &AppState, id: i64) -> Result<std::result::Result<LostFoundItem, LifecycleError>> {
	match repository::get(&state.pool, id).await {
		Ok(item) => Ok(Ok(item)),
		Err(Error::NotFound(_)) => Ok(Err(LifecycleError::InvalidTransition)),
		Err(err) => Err(err),
	}
}

/// `POST /lost-and-found/item/<id>/claim`
pub async fn claim_item(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;

	let claimed = match load_for_transition(&state, id).await? {
		Ok(mut item) => item.claim(Actor::from(&user)).map(|()| item),
		Err(refused) => Err(refused),
	};
	let item = match claimed {
		Ok(item) => item,
		Err(refused) => return Ok(redirect_with(&request, refused.flash(), detail_url(id))),
	};
	repository::save(&state.pool, &item, None, state.now()).await?;

	tracing::info!(item_id = id, user_id = user.id, "item claimed");
	Ok(redirect_with(&request, Message::success("Item claimed successfully!"), detail_url(id)))
}

/// `POST /lost-and-found/item/<id>/found_user`
pub async fn found_user(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;

	let found = match load_for_transition(&state, id).await? {
		Ok(mut item) => item.mark_found(Actor::from(&user)).map(|()| item),
		Err(refused) => Err(refused),
	};
	let item = match found {
		Ok(item) => item,
		Err(refused) => return Ok(redirect_with(&request, refused.flash(), detail_url(id))),
	};
	repository::save(&state.pool, &item, None, state.now()).await?;

	tracing::info!(item_id = id, user_id = user.id, "item marked as found");
	Ok(redirect_with(&request, Message::success("Item marked as found!"), detail_url(id)))
}

/// `POST /lost-and-found/item/<id>/remove_claim`
pub async fn remove_claim(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;
	let not_authorized = LifecycleError::NotAuthorized("Not authorized to remove claim.");

	let removed = match load_for_transition(&state, id).await? {
		Ok(mut item) => item.remove_claim(Actor::from(&user)).map(|()| item),
		Err(_) => Err(not_authorized),
	};
	let item = match removed {
		Ok(item) => item,
		Err(refused) => return Ok(redirect_with(&request, refused.flash(), DASHBOARD_URL)),
	};
	repository::save(&state.pool, &item, None, state.now()).await?;

	tracing::info!(item_id = id, user_id = user.id, "claim removed");
	Ok(redirect_with(
		&request,
		Message::success("Claim removed; item status set back to Found."),
		DASHBOARD_URL,
	))
}

/// `POST /lost-and-found/item/<id>/remove_found`
pub async fn remove_found(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let id = request.path_param_i64("id")?;
	let not_authorized = LifecycleError::NotAuthorized("Not authorized to remove found tag.");

	let removed = match load_for_transition(&state, id).await? {
		Ok(mut item) => item.remove_found_tag(Actor::from(&user)).map(|()| item),
		Err(_) => Err(not_authorized),
	};
	let item = match removed {
		Ok(item) => item,
		Err(refused @ LifecycleError::NothingToRemove(_)) => {
			return Ok(redirect_with(&request, refused.flash(), detail_url(id)));
		}
		Err(refused) => return Ok(redirect_with(&request, refused.flash(), DASHBOARD_URL)),
	};
	repository::save(&state.pool, &item, None, state.now()).await?;

	tracing::info!(item_id = id, user_id = user.id, "found tag removed");
	let back = request.header("referer").unwrap_or(DASHBOARD_URL).to_string();
	Ok(redirect_with(&request, Message::success("Found tag removed."), back))
}
