//! Route table and request dispatch

use crate::pattern::PathPattern;
use async_trait::async_trait;
use campus_core::{Error, Result};
use campus_http::{Handler, Request, Response};
use hyper::Method;
use std::sync::Arc;

/// One entry of the route table.
pub struct Route {
	pattern: PathPattern,
	methods: Vec<Method>,
	handler: Arc<dyn Handler>,
}

impl Route {
	pub fn new(pattern: &str, methods: &[Method], handler: Arc<dyn Handler>) -> Result<Self> {
		let pattern = PathPattern::new(pattern).map_err(Error::Internal)?;
		Ok(Self {
			pattern,
			methods: methods.to_vec(),
			handler,
		})
	}

	pub fn pattern(&self) -> &str {
		self.pattern.pattern()
	}

	pub fn methods(&self) -> &[Method] {
		&self.methods
	}

	fn accepts(&self, method: &Method) -> bool {
		self.methods.contains(method) || (*method == Method::HEAD && self.methods.contains(&Method::GET))
	}
}

impl std::fmt::Debug for Route {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern.pattern())
			.field("methods", &self.methods)
			.finish()
	}
}

/// Ordered route table. The first route whose pattern and method both
/// match handles the request.
///
/// # Examples
///
/// ```
/// use campus_urls::Router;
/// use campus_http::{Handler, Request, Response};
/// use std::sync::Arc;
///
/// struct Dashboard;
///
/// #[async_trait::async_trait]
/// impl Handler for Dashboard {
///     async fn handle(&self, _request: Request) -> campus_core::Result<Response> {
///         Ok(Response::ok())
///     }
/// }
///
/// let router = Router::new()
///     .get("/marketplace/", Arc::new(Dashboard))
///     .unwrap();
/// assert_eq!(router.routes().len(), 1);
/// ```
#[derive(Debug)]
pub struct Router {
	routes: Vec<Route>,
	append_slash: bool,
}

impl Default for Router {
	fn default() -> Self {
		Self::new()
	}
}

impl Router {
	pub fn new() -> Self {
		Self {
			routes: Vec::new(),
			append_slash: true,
		}
	}

	/// Whether `/foo` should redirect to `/foo/` when only the latter
	/// exists. Enabled by default.
	pub fn with_append_slash(mut self, enabled: bool) -> Self {
		self.append_slash = enabled;
		self
	}

	pub fn route(mut self, pattern: &str, methods: &[Method], handler: Arc<dyn Handler>) -> Result<Self> {
		self.routes.push(Route::new(pattern, methods, handler)?);
		Ok(self)
	}

	pub fn get(self, pattern: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.route(pattern, &[Method::GET], handler)
	}

	pub fn post(self, pattern: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.route(pattern, &[Method::POST], handler)
	}

	/// Route serving both the form page (GET) and its submission (POST).
	pub fn get_post(self, pattern: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.route(pattern, &[Method::GET, Method::POST], handler)
	}

	/// Mount every route of `other` under `prefix`.
	pub fn include(mut self, prefix: &str, other: Router) -> Result<Self> {
		let prefix = prefix.trim_end_matches('/');
		for route in other.routes {
			let pattern = format!("{}{}", prefix, route.pattern.pattern());
			self.routes
				.push(Route::new(&pattern, &route.methods, route.handler)?);
		}
		Ok(self)
	}

	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	fn method_not_allowed(path: &str, allowed: &[Method]) -> Response {
		let allow = allowed
			.iter()
			.map(Method::as_str)
			.collect::<Vec<_>>()
			.join(", ");
		Response::from(Error::MethodNotAllowed(format!("Method not allowed for {}", path)))
			.with_header("allow", &allow)
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let path = request.path().to_string();
		let mut allowed: Vec<Method> = Vec::new();

		for route in &self.routes {
			let Some(params) = route.pattern.matches(&path) else {
				continue;
			};
			if route.accepts(&request.method) {
				for (key, value) in params {
					request.set_path_param(key, value);
				}
				return route.handler.handle(request).await;
			}
			for method in &route.methods {
				if !allowed.contains(method) {
					allowed.push(method.clone());
				}
			}
		}

		if !allowed.is_empty() {
			return Ok(Self::method_not_allowed(&path, &allowed));
		}

		if self.append_slash && !path.ends_with('/') {
			let candidate = format!("{}/", path);
			if self.routes.iter().any(|r| r.pattern.is_match(&candidate)) {
				let location = match request.uri.query() {
					Some(query) => format!("{}?{}", candidate, query),
					None => candidate,
				};
				tracing::debug!(%path, %location, "appending slash");
				return Ok(Response::permanent_redirect(location));
			}
		}

		Err(Error::NotFound(format!("No route for {}", path)))
	}
}
