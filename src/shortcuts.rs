//! View helpers: JSON page contexts, redirects with flash messages and
//! the current user.

use crate::apps::accounts::models::User;
use campus_auth::RequestSessionExt;
use campus_core::{Error, Message, Result};
use campus_http::{Request, Response};
use serde::Serialize;
use serde_json::Value;

/// Render a page context as JSON. Pending flash messages are consumed and
/// added under `messages`.
pub fn render_json<T: Serialize>(request: &Request, context: &T) -> Result<Response> {
	let mut value = serde_json::to_value(context)?;
	let messages = request.session().take_messages();
	match &mut value {
		Value::Object(map) => {
			map.insert("messages".to_string(), serde_json::to_value(messages)?);
		}
		_ => {
			return Err(Error::Internal(
				"page context must serialize to a JSON object".to_string(),
			));
		}
	}
	Response::ok().with_json(&value)
}

pub fn redirect(to: impl AsRef<str>) -> Response {
	Response::temporary_redirect(to)
}

/// Queue `message` and redirect to `to`.
pub fn redirect_with(request: &Request, message: Message, to: impl AsRef<str>) -> Response {
	request.session().add_message(message);
	Response::temporary_redirect(to)
}

/// Report a failed form submission. Client-side failures and delegate
/// failures are flashed and redirected to `to`; anything else propagates
/// and ends up as a 500.
pub fn redirect_on_error(request: &Request, error: Error, to: impl AsRef<str>) -> Result<Response> {
	match error {
		Error::Database(_) | Error::Serialization(_) | Error::Internal(_) => Err(error),
		other => {
			tracing::debug!(error = %other, path = %request.path(), "form rejected");
			Ok(redirect_with(request, Message::error(flash_text(&other)), to))
		}
	}
}

/// Text of `error` as shown in a flash message.
pub fn flash_text(error: &Error) -> String {
	match error {
		// Delegate reasons are already safe to show.
		Error::External(detail) => detail.clone(),
		other => other.public_message(),
	}
}

/// The logged-in user. Handlers behind `login_required` can rely on it.
pub fn require_user(request: &Request) -> Result<User> {
	request
		.current_user::<User>()
		.into_user()
		.ok_or_else(|| Error::Authentication("Login required".to_string()))
}
