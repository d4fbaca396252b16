//! URL configuration
//!
//! `url_patterns` mounts every app under its prefix. `application` wraps
//! the router in the middleware stack.

use super::media::{MEDIA_PREFIX, serve_media};
use super::middleware::create_middleware_stack;
use crate::apps::{accounts, lost_and_found, marketplace};
use crate::state::AppState;
use campus_conf::StorageBackendKind;
use campus_core::Result;
use campus_http::{Handler, MiddlewareChain};
use campus_urls::{Router, handler_fn};
use std::sync::Arc;

pub fn url_patterns(state: Arc<AppState>) -> Result<Router> {
	let mut router = Router::new()
		.get("/", handler_fn(state.clone(), accounts::views::index))?
		.include(accounts::urls::PREFIX, accounts::urls::url_patterns(state.clone())?)?
		.include(
			lost_and_found::urls::PREFIX,
			lost_and_found::urls::url_patterns(state.clone())?,
		)?
		.include(marketplace::urls::PREFIX, marketplace::urls::url_patterns(state.clone())?)?;

	if state.settings.storage.backend == StorageBackendKind::Local {
		router = router.get(
			&format!("{}/<path:path>", MEDIA_PREFIX),
			handler_fn(state, serve_media),
		)?;
	}
	Ok(router)
}

/// The complete request handler: routes behind the middleware stack.
pub fn application(state: Arc<AppState>) -> Result<Arc<dyn Handler>> {
	let router: Arc<dyn Handler> = Arc::new(url_patterns(state.clone())?);
	let chain = create_middleware_stack(&state)
		.into_iter()
		.fold(MiddlewareChain::new(router), |chain, middleware| {
			chain.with_middleware(middleware)
		});
	Ok(Arc::new(chain))
}
