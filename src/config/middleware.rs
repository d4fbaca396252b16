//! Middleware stack shared by the server and the in-process test client.

use crate::apps::accounts::{DatabaseAuthBackend, User};
use crate::state::AppState;
use campus_auth::{AuthenticationMiddleware, SessionMiddleware};
use campus_http::{LoggingMiddleware, Middleware};
use std::sync::Arc;

/// Outermost first: request logging, then the session, then identity
/// resolution from the session.
pub fn create_middleware_stack(state: &AppState) -> Vec<Arc<dyn Middleware>> {
	let sessions = SessionMiddleware::new(state.sessions.clone())
		.with_secure_cookie(state.settings.session.cookie_secure);
	let backend = Arc::new(DatabaseAuthBackend::new(state.pool.clone()));

	vec![
		Arc::new(LoggingMiddleware::new()),
		Arc::new(sessions),
		Arc::new(AuthenticationMiddleware::<User, DatabaseAuthBackend>::new(backend)),
	]
}
