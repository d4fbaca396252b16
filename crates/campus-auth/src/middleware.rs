//! Session and authentication middleware
//!
//! [`SessionMiddleware`] loads the session named by the `sessionid` cookie
//! and exposes it to handlers as a [`Session`] in the request extensions.
//! After the handler runs it persists changes and sets or clears the
//! cookie. [`AuthenticationMiddleware`] must run inside it: it reads the
//! user id from the session and places a [`CurrentUser`] next to it.

use crate::current_user::{AuthUser, CurrentUser};
use crate::session::{
	SESSION_KEY_MESSAGES, SESSION_KEY_USER_ID, SessionData, SessionId, SessionStore,
	is_valid_session_id,
};
use async_trait::async_trait;
use campus_core::{Message, Result};
use campus_http::{Handler, Middleware, Request, Response, SetCookie};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;

pub const SESSION_COOKIE_NAME: &str = "sessionid";

#[derive(Debug)]
struct SessionState {
	id: Option<SessionId>,
	data: SessionData,
	modified: bool,
	cycled_from: Option<SessionId>,
}

/// Per-request handle on the session. Clones share state.
#[derive(Debug, Clone)]
pub struct Session {
	state: Arc<Mutex<SessionState>>,
}

impl Session {
	fn new(id: Option<SessionId>, data: SessionData) -> Self {
		Self {
			state: Arc::new(Mutex::new(SessionState {
				id,
				data,
				modified: false,
				cycled_from: None,
			})),
		}
	}

	/// A fresh, empty session with no id yet.
	pub fn empty() -> Self {
		Self::new(None, SessionData::new())
	}

	pub fn id(&self) -> Option<SessionId> {
		self.state.lock().id.clone()
	}

	pub fn get(&self, key: &str) -> Option<serde_json::Value> {
		self.state.lock().data.get(key).cloned()
	}

	pub fn set(&self, key: impl Into<String>, value: serde_json::Value) {
		let mut state = self.state.lock();
		state.data.set(key, value);
		state.modified = true;
	}

	pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
		let mut state = self.state.lock();
		let removed = state.data.remove(key);
		if removed.is_some() {
			state.modified = true;
		}
		removed
	}

	/// Id of the logged-in user, if any.
	pub fn user_id(&self) -> Option<i64> {
		self.get(SESSION_KEY_USER_ID).and_then(|v| v.as_i64())
	}

	/// Bind the session to `user_id` under a new session id.
	pub fn login(&self, user_id: i64) {
		self.cycle_id();
		self.set(SESSION_KEY_USER_ID, serde_json::json!(user_id));
	}

	/// Drop all data and invalidate the id. Unless something is stored
	/// afterwards, the cookie is cleared on the response.
	pub fn flush(&self) {
		let mut state = self.state.lock();
		state.data.clear();
		Self::retire_id(&mut state);
	}

	/// Keep the data but move it to a new id, invalidating the old one.
	pub fn cycle_id(&self) {
		let mut state = self.state.lock();
		Self::retire_id(&mut state);
	}

	fn retire_id(state: &mut SessionState) {
		if state.cycled_from.is_none() {
			state.cycled_from = state.id.take();
		} else {
			state.id = None;
		}
		state.modified = true;
	}

	/// Queue a flash message for the next page.
	pub fn add_message(&self, message: Message) {
		let mut messages = self.peek_messages();
		messages.push(message);
		self.set(
			SESSION_KEY_MESSAGES,
			serde_json::to_value(messages).unwrap_or_default(),
		);
	}

	/// Queued flash messages, left in place.
	pub fn peek_messages(&self) -> Vec<Message> {
		self.get(SESSION_KEY_MESSAGES)
			.and_then(|v| serde_json::from_value(v).ok())
			.unwrap_or_default()
	}

	/// Remove and return queued flash messages.
	pub fn take_messages(&self) -> Vec<Message> {
		self.remove(SESSION_KEY_MESSAGES)
			.and_then(|v| serde_json::from_value(v).ok())
			.unwrap_or_default()
	}
}

/// Accessors for values the auth middleware place on a request.
pub trait RequestSessionExt {
	/// The request's session. Without [`SessionMiddleware`] this is a
	/// detached empty session whose changes are discarded.
	fn session(&self) -> Session;

	fn current_user<U>(&self) -> CurrentUser<U>
	where
		U: Clone + Send + Sync + 'static;
}

impl RequestSessionExt for Request {
	fn session(&self) -> Session {
		self.extensions.get::<Session>().unwrap_or_else(Session::empty)
	}

	fn current_user<U>(&self) -> CurrentUser<U>
	where
		U: Clone + Send + Sync + 'static,
	{
		self.extensions
			.get::<CurrentUser<U>>()
			.unwrap_or_else(CurrentUser::anonymous)
	}
}

pub struct SessionMiddleware {
	store: Arc<dyn SessionStore>,
	cookie_secure: bool,
}

impl SessionMiddleware {
	pub fn new(store: Arc<dyn SessionStore>) -> Self {
		Self {
			store,
			cookie_secure: false,
		}
	}

	pub fn with_secure_cookie(mut self, secure: bool) -> Self {
		self.cookie_secure = secure;
		self
	}

	async fn load(&self, request: &Request) -> Session {
		let Some(id) = request
			.cookie(SESSION_COOKIE_NAME)
			.filter(|id| is_valid_session_id(id))
		else {
			return Session::empty();
		};

		match self.store.load(&id).await {
			Ok(Some(data)) => Session::new(Some(id), data),
			// Unknown ids are never adopted.
			Ok(None) => Session::empty(),
			Err(err) => {
				tracing::warn!(error = %err, "failed to load session, starting a new one");
				Session::empty()
			}
		}
	}

	async fn persist(&self, session: &Session, had_cookie: bool, response: &mut Response) -> Result<()> {
		let (id, data, cycled_from) = {
			let mut state = session.state.lock();
			if !state.modified {
				return Ok(());
			}
			(
				state.id.take(),
				std::mem::take(&mut state.data),
				state.cycled_from.take(),
			)
		};

		if let Some(old) = cycled_from {
			self.store.delete(&old).await?;
		}

		if data.is_empty() {
			if let Some(id) = id {
				self.store.delete(&id).await?;
			}
			if had_cookie {
				response.add_cookie(&SetCookie::removal(SESSION_COOKIE_NAME));
			}
			return Ok(());
		}

		let id = id.unwrap_or_else(|| self.store.create_session_id());
		self.store.save(&id, &data).await?;
		response.add_cookie(&SetCookie::new(SESSION_COOKIE_NAME, id).secure(self.cookie_secure));
		Ok(())
	}
}

#[async_trait]
impl Middleware for SessionMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let had_cookie = request.cookie(SESSION_COOKIE_NAME).is_some();
		let session = self.load(&request).await;
		request.extensions.insert(session.clone());

		let mut response = match next.handle(request).await {
			Ok(response) => response,
			Err(err) => Response::from(err),
		};

		self.persist(&session, had_cookie, &mut response).await?;
		Ok(response)
	}
}

/// Loads users by id for [`AuthenticationMiddleware`].
#[async_trait]
pub trait AuthenticationBackend<U>: Send + Sync {
	async fn get_user(&self, user_id: i64) -> Result<Option<U>>;
}

pub struct AuthenticationMiddleware<U, B> {
	backend: Arc<B>,
	_user: PhantomData<fn() -> U>,
}

impl<U, B> AuthenticationMiddleware<U, B> {
	pub fn new(backend: Arc<B>) -> Self {
		Self {
			backend,
			_user: PhantomData,
		}
	}
}

#[async_trait]
impl<U, B> Middleware for AuthenticationMiddleware<U, B>
where
	U: AuthUser + Clone + Send + Sync + 'static,
	B: AuthenticationBackend<U> + 'static,
{
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let session = request.session();
		let current = match session.user_id() {
			Some(user_id) => match self.backend.get_user(user_id).await? {
				Some(user) => CurrentUser::authenticated(user),
				None => {
					tracing::debug!(user_id, "session refers to a missing user");
					session.remove(SESSION_KEY_USER_ID);
					CurrentUser::anonymous()
				}
			},
			None => CurrentUser::anonymous(),
		};
		request.extensions.insert(current);
		next.handle(request).await
	}
}
