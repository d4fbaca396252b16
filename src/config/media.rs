//! Serves uploaded images when the local storage backend is configured.
//! Paths are `<bucket>/<object name>` under `storage.local_dir`.

use crate::state::AppState;
use campus_core::{Error, Result};
use campus_http::{Request, Response};
use campus_storages::guess_content_type;
use hyper::header::CONTENT_TYPE;
use std::path::PathBuf;
use std::sync::Arc;

pub const MEDIA_PREFIX: &str = "/media";

fn object_path(base: &str, rest: &str) -> Option<PathBuf> {
	let (bucket, name) = rest.split_once('/')?;
	let valid = |part: &str| !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\']);
	if !valid(bucket) || !valid(name) {
		return None;
	}
	Some(PathBuf::from(base).join(bucket).join(name))
}

/// `GET /media/<path:path>`
pub async fn serve_media(state: Arc<AppState>, request: Request) -> Result<Response> {
	let rest = request.path_param("path").unwrap_or_default();
	let not_found = || Error::NotFound("File not found".to_string());

	let path = object_path(&state.settings.storage.local_dir, rest).ok_or_else(not_found)?;
	let content = match tokio::fs::read(&path).await {
		Ok(content) => content,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
		Err(err) => return Err(Error::Internal(format!("Failed to read {}: {}", path.display(), err))),
	};

	Ok(Response::ok()
		.with_header(CONTENT_TYPE.as_str(), &guess_content_type(rest))
		.with_body(content))
}
