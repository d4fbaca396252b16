//! Function handlers bound to shared application state

use async_trait::async_trait;
use campus_core::Result;
use campus_http::{Handler, Request, Response};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Adapts an `async fn(Arc<S>, Request) -> Result<Response>` into a [`Handler`].
pub struct FnHandler<S, F, Fut> {
	state: Arc<S>,
	func: F,
	_future: PhantomData<fn() -> Fut>,
}

impl<S, F, Fut> FnHandler<S, F, Fut> {
	pub fn new(state: Arc<S>, func: F) -> Self {
		Self {
			state,
			func,
			_future: PhantomData,
		}
	}
}

#[async_trait]
impl<S, F, Fut> Handler for FnHandler<S, F, Fut>
where
	S: Send + Sync + 'static,
	F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		(self.func)(self.state.clone(), request).await
	}
}

/// Shorthand for `Arc::new(FnHandler::new(state, func))`.
pub fn handler_fn<S, F, Fut>(state: Arc<S>, func: F) -> Arc<dyn Handler>
where
	S: Send + Sync + 'static,
	F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	Arc::new(FnHandler::new(state, func))
}
