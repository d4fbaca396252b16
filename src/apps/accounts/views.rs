//! Login, registration, email confirmation and the profile pages.

use super::models::{GUEST_USERNAME, NewUser, ProfileChanges, User};
use super::repository::{self as users, DUPLICATE_ACCOUNT_MESSAGE};
use super::urls::{LOGIN_URL, PROFILE_URL, REGISTER_URL, confirm_path};
use crate::apps::lost_and_found::{self, LostFoundItem};
use crate::apps::marketplace::{self, MarketplaceItem};
use crate::shortcuts::{redirect, redirect_on_error, redirect_with, render_json, require_user};
use crate::state::AppState;
use campus_auth::rate_limit::{RATE_LIMIT_COOKIE, is_rate_limited, rate_limit_cookie};
use campus_auth::{RequestSessionExt, SigningError, is_safe_next};
use campus_core::{Error, Message, Result};
use campus_http::{FormData, Request, Response};
use campus_mail::EmailMessage;
use chrono::{DateTime, Duration, Utc};
use hyper::Method;
use serde::Serialize;
use std::sync::Arc;

const DASHBOARD_URL: &str = lost_and_found::urls::DASHBOARD_URL;

/// Confirmation links expire after an hour.
pub const CONFIRMATION_MAX_AGE_HOURS: i64 = 1;

const PROFILE_RECENT_PER_KIND: usize = 5;

#[derive(Serialize)]
struct LoginContext {
	#[serde(skip_serializing_if = "Option::is_none")]
	next: Option<String>,
}

#[derive(Serialize)]
struct ProfileContext {
	user: User,
	lost_found_items: Vec<LostFoundItem>,
	marketplace_items: Vec<MarketplaceItem>,
	recent_items: Vec<RecentItem>,
}

/// One entry of the profile's recent activity, tagged with its kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RecentItem {
	LostFound(LostFoundItem),
	Marketplace(MarketplaceItem),
}

impl RecentItem {
	fn date(&self) -> DateTime<Utc> {
		match self {
			RecentItem::LostFound(item) => item.date,
			RecentItem::Marketplace(item) => item.date,
		}
	}
}

fn is_authenticated(request: &Request) -> bool {
	request.current_user::<User>().is_authenticated()
}

/// `GET /`
pub async fn index(_state: Arc<AppState>, request: Request) -> Result<Response> {
	if is_authenticated(&request) {
		Ok(redirect(DASHBOARD_URL))
	} else {
		Ok(redirect(LOGIN_URL))
	}
}

/// `GET/POST /auth/login`
pub async fn login(state: Arc<AppState>, request: Request) -> Result<Response> {
	if is_authenticated(&request) {
		return Ok(redirect(DASHBOARD_URL));
	}

	if request.method != Method::POST {
		let context = LoginContext {
			next: request.query_param("next"),
		};
		return render_json(&request, &context);
	}

	let form = request.form().await?;
	let next = form
		.get("next")
		.map(str::to_string)
		.or_else(|| request.query_param("next"));
	let username = form.get_or_empty("username").trim().to_string();
	let password = form.get_or_empty("password");

	let user = match users::find_by_username(&state.pool, &username).await? {
		Some(user) if state.hasher.verify(password, &user.password)? => user,
		_ => {
			tracing::info!(username = %username, "failed login attempt");
			request
				.session()
				.add_message(Message::error("Invalid username or password"));
			return render_json(&request, &LoginContext { next });
		}
	};

	if !user.is_confirmed {
		return Ok(redirect_with(
			&request,
			Message::warning("Please confirm your email before logging in."),
			LOGIN_URL,
		));
	}

	request.session().login(user.id);
	users::record_login(&state.pool, user.id, state.now()).await?;
	tracing::info!(user_id = user.id, "user logged in");

	let target = next.filter(|n| is_safe_next(n)).unwrap_or_else(|| DASHBOARD_URL.to_string());
	Ok(redirect(target))
}

/// `GET /auth/continue_without_login`: sign in as the shared guest.
pub async fn continue_without_login(state: Arc<AppState>, request: Request) -> Result<Response> {
	let Some(guest) = users::find_by_username(&state.pool, GUEST_USERNAME).await? else {
		return Ok(redirect_with(
			&request,
			Message::warning("Temporary user does not exist!"),
			LOGIN_URL,
		));
	};

	request.session().login(guest.id);
	users::record_login(&state.pool, guest.id, state.now()).await?;
	tracing::info!(user_id = guest.id, "guest session started");
	Ok(redirect(DASHBOARD_URL))
}

/// `GET/POST /auth/register`
pub async fn register(state: Arc<AppState>, request: Request) -> Result<Response> {
	if is_authenticated(&request) {
		return Ok(redirect(DASHBOARD_URL));
	}

	if request.method != Method::POST {
		return render_json(&request, &serde_json::json!({}));
	}

	let now = state.now();
	if is_rate_limited(request.cookie(RATE_LIMIT_COOKIE).as_deref(), now) {
		return Ok(redirect_with(
			&request,
			Message::warning("Rate-limited. Wait a minute."),
			REGISTER_URL,
		));
	}

	let form = request.form().await?;
	let user = match create_account(&state, &form, now).await {
		Ok(user) => user,
		Err(err) => return redirect_on_error(&request, err, REGISTER_URL),
	};
	tracing::info!(user_id = user.id, "account registered");

	match send_confirmation(&state, &user).await {
		Ok(()) => Ok(redirect_with(
			&request,
			Message::success("Registration successful! Please check your email to confirm your account."),
			LOGIN_URL,
		)
		.with_cookie(&rate_limit_cookie(now))),
		Err(err) => {
			tracing::error!(user_id = user.id, error = %err, "failed to send confirmation email");
			Ok(redirect_with(
				&request,
				Message::error("Failed to send confirmation email. Please contact support."),
				LOGIN_URL,
			))
		}
	}
}

async fn create_account(state: &AppState, form: &FormData, now: DateTime<Utc>) -> Result<User> {
	let username = form.required("username")?.trim().to_string();
	let email = form.required("email")?.trim().to_string();
	let password = form.required("password")?;
	if password != form.get_or_empty("confirm_password") {
		return Err(Error::Validation("Passwords don't match.".to_string()));
	}
	// The guest name is reserved even before the guest account exists.
	if username == GUEST_USERNAME || users::username_or_email_taken(&state.pool, &username, &email).await? {
		return Err(Error::Validation(DUPLICATE_ACCOUNT_MESSAGE.to_string()));
	}

	let new_user = NewUser {
		username,
		email,
		password_hash: state.hasher.hash(password)?,
		is_confirmed: false,
	};
	users::create(&state.pool, &new_user, now).await
}

async fn send_confirmation(state: &AppState, user: &User) -> Result<()> {
	let token = state.signer.sign(&user.email);
	let link = state.absolute_url(&confirm_path(&token));
	let message = EmailMessage::builder()
		.from(state.settings.email.from_email.clone())
		.to(vec![user.email.clone()])
		.subject("Confirm Your Email")
		.body(format!("Please click the link to confirm your email: {}", link))
		.build()
		.map_err(|err| Error::External(err.to_string()))?;

	state
		.mailer
		.send_messages(&[message])
		.await
		.map_err(|err| Error::External(err.to_string()))?;
	Ok(())
}

/// `GET /auth/confirm/<token>`
pub async fn confirm_email(state: Arc<AppState>, request: Request) -> Result<Response> {
	let token = request.path_param("token").unwrap_or_default();

	let message = match state
		.signer
		.unsign(token, Duration::hours(CONFIRMATION_MAX_AGE_HOURS))
	{
		Err(SigningError::Expired) => Message::error("The confirmation link has expired."),
		Err(SigningError::Invalid) => Message::error("Invalid confirmation link."),
		Ok(email) => {
			if users::confirm_email(&state.pool, &email, state.now()).await? {
				tracing::info!(email = %email, "email confirmed");
				Message::success("Email confirmed! You can now log in.")
			} else {
				Message::error("User not found.")
			}
		}
	};
	Ok(redirect_with(&request, message, LOGIN_URL))
}

/// `GET /auth/logout`
pub async fn logout(_state: Arc<AppState>, request: Request) -> Result<Response> {
	let session = request.session();
	if let Some(user_id) = session.user_id() {
		tracing::info!(user_id, "user logged out");
	}
	session.flush();
	Ok(redirect_with(&request, Message::info("You have been logged out."), LOGIN_URL))
}

/// `GET/POST /auth/profile`
pub async fn profile(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;

	if request.method == Method::POST {
		let form = request.form().await?;
		let message = if delete_owned_item(&state, &form, user.id).await? {
			Message::success("Item deleted successfully.")
		} else {
			Message::error("You are not authorized to delete this item.")
		};
		return Ok(redirect_with(&request, message, PROFILE_URL));
	}

	let lost_found_items = lost_and_found::repository::list_by_owner(&state.pool, user.id).await?;
	let marketplace_items = marketplace::repository::list_by_owner(&state.pool, user.id).await?;

	let mut recent_items: Vec<RecentItem> = lost_found_items
		.iter()
		.take(PROFILE_RECENT_PER_KIND)
		.cloned()
		.map(RecentItem::LostFound)
		.chain(
			marketplace_items
				.iter()
				.take(PROFILE_RECENT_PER_KIND)
				.cloned()
				.map(RecentItem::Marketplace),
		)
		.collect();
	recent_items.sort_by(|a, b| b.date().cmp(&a.date()));

	let context = ProfileContext {
		user,
		lost_found_items,
		marketplace_items,
		recent_items,
	};
	render_json(&request, &context)
}

/// Soft-delete the item named by `lost_found_id` or `market_id` if the user
/// owns it.
async fn delete_owned_item(state: &AppState, form: &FormData, user_id: i64) -> Result<bool> {
	let now = state.now();
	if let Some(raw) = form.get("lost_found_id") {
		let Ok(id) = raw.trim().parse::<i64>() else {
			return Ok(false);
		};
		return lost_and_found::repository::soft_delete_owned(&state.pool, id, user_id, now).await;
	}
	if let Some(raw) = form.get("market_id") {
		let Ok(id) = raw.trim().parse::<i64>() else {
			return Ok(false);
		};
		return marketplace::repository::soft_delete_owned(&state.pool, id, user_id, now).await;
	}
	Ok(false)
}

/// `POST /auth/update_profile`
pub async fn update_profile(state: Arc<AppState>, request: Request) -> Result<Response> {
	let user = require_user(&request)?;
	let form = request.form().await?;

	let changes = match profile_changes(&state, &user, &form).await {
		Ok(changes) => changes,
		Err(err) => return redirect_on_error(&request, err, PROFILE_URL),
	};
	if !changes.is_empty() {
		users::update_profile(&state.pool, user.id, &changes, state.now()).await?;
		tracing::info!(user_id = user.id, "profile updated");
	}
	Ok(redirect_with(
		&request,
		Message::success("Profile updated successfully."),
		PROFILE_URL,
	))
}

/// Validate every submitted change before anything is written.
async fn profile_changes(state: &AppState, user: &User, form: &FormData) -> Result<ProfileChanges> {
	let mut changes = ProfileChanges::default();

	let username = form.get_or_empty("username").trim();
	if !username.is_empty() && username != user.username {
		if username == GUEST_USERNAME || users::username_taken_by_other(&state.pool, username, user.id).await? {
			return Err(Error::Validation("Username already taken.".to_string()));
		}
		changes.username = Some(username.to_string());
	}

	let email = form.get_or_empty("email").trim();
	if !email.is_empty() && email != user.email {
		if users::email_taken_by_other(&state.pool, email, user.id).await? {
			return Err(Error::Validation("Email already taken.".to_string()));
		}
		changes.email = Some(email.to_string());
	}

	let role = form.get_or_empty("role").trim();
	if !role.is_empty() {
		changes.role = Some(role.to_string());
	}

	let new_password = form.get_or_empty("new_password");
	if !new_password.is_empty() {
		if new_password != form.get_or_empty("confirm_password") {
			return Err(Error::Validation("Passwords do not match.".to_string()));
		}
		if !state.hasher.verify(form.get_or_empty("current_password"), &user.password)? {
			return Err(Error::Validation("Current password is incorrect.".to_string()));
		}
		changes.password_hash = Some(state.hasher.hash(new_password)?);
	}

	Ok(changes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::apps::lost_and_found::models::{LostFoundStatus, item_fixture};
	use rstest::rstest;

	#[rstest]
	fn test_recent_item_is_tagged_with_kind() {
		let item = item_fixture(1, LostFoundStatus::Lost);

		let value = serde_json::to_value(RecentItem::LostFound(item)).unwrap();

		assert_eq!(value["type"], "lost_found");
		assert_eq!(value["status"], "lost");
	}
}
