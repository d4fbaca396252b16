//! The identity resolved for one request

/// What the auth layer needs to know about a user record.
pub trait AuthUser {
	fn id(&self) -> i64;
	fn username(&self) -> &str;
	fn is_admin(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct CurrentUser<U> {
	user: Option<U>,
}

impl<U> CurrentUser<U> {
	pub fn authenticated(user: U) -> Self {
		Self { user: Some(user) }
	}

	pub fn anonymous() -> Self {
		Self { user: None }
	}

	pub fn is_authenticated(&self) -> bool {
		self.user.is_some()
	}

	pub fn user(&self) -> Option<&U> {
		self.user.as_ref()
	}

	pub fn into_user(self) -> Option<U> {
		self.user
	}
}

impl<U: AuthUser> CurrentUser<U> {
	pub fn id(&self) -> Option<i64> {
		self.user.as_ref().map(AuthUser::id)
	}
}

impl<U> Default for CurrentUser<U> {
	fn default() -> Self {
		Self::anonymous()
	}
}
