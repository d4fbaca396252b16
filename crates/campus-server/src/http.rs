use bytes::Bytes;
use campus_core::Error;
use campus_http::form::MAX_FORM_BODY_SIZE;
use campus_http::{Handler, Middleware, MiddlewareChain, Request, Response};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Errors that stop the server loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},
	#[error("Failed to accept connection: {0}")]
	Accept(#[from] std::io::Error),
}

/// Serves one root [`Handler`] wrapped in middleware.
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
		}
	}

	/// Add a middleware. The first one added is the outermost.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// The root handler with every middleware applied.
	pub fn build_handler(&self) -> Arc<dyn Handler> {
		if self.middlewares.is_empty() {
			return self.handler.clone();
		}

		let mut chain = MiddlewareChain::new(self.handler.clone());
		for middleware in &self.middlewares {
			chain.add_middleware(middleware.clone());
		}
		Arc::new(chain)
	}

	/// Bind `addr` and serve until `shutdown` resolves.
	pub async fn listen_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
	where
		F: Future<Output = ()>,
	{
		let listener = TcpListener::bind(addr)
			.await
			.map_err(|source| ServerError::Bind { addr, source })?;
		self.serve(listener, shutdown).await
	}

	/// Serve connections from an already bound listener until `shutdown`
	/// resolves. In-flight connections are left to finish on their own.
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
	where
		F: Future<Output = ()>,
	{
		if let Ok(local) = listener.local_addr() {
			tracing::info!(addr = %local, "server listening");
		}

		let handler = self.build_handler();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = result?;
					let handler = handler.clone();
					tokio::task::spawn(async move {
						if let Err(err) = Self::handle_connection(stream, socket_addr, handler).await {
							tracing::warn!(peer = %socket_addr, error = %err, "connection error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, stopping server");
					break;
				}
			}
		}

		Ok(())
	}

	async fn handle_connection(
		stream: TcpStream,
		socket_addr: SocketAddr,
		handler: Arc<dyn Handler>,
	) -> Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr: socket_addr,
		};

		http1::Builder::new().serve_connection(io, service).await
	}
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "failed to install Ctrl-C handler");
		std::future::pending::<()>().await;
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = hyper::http::Error;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();

			let response = match Limited::new(body, MAX_FORM_BODY_SIZE).collect().await {
				Ok(collected) => {
					let mut request = Request::new(
						parts.method,
						parts.uri,
						parts.version,
						parts.headers,
						collected.to_bytes(),
					);
					request.remote_addr = Some(remote_addr);

					handler.handle(request).await.unwrap_or_else(Response::from)
				}
				Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
					Response::from(Error::PayloadTooLarge(format!(
						"Request body exceeds {} bytes",
						MAX_FORM_BODY_SIZE
					)))
				}
				Err(err) => Response::from(Error::BadRequest(format!(
					"Failed to read request body: {}",
					err
				))),
			};

			let mut hyper_response = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				hyper_response = hyper_response.header(key, value);
			}

			hyper_response.body(Full::new(response.body))
		})
	}
}
