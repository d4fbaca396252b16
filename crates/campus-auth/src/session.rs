//! Server-side sessions
//!
//! The client only holds an opaque id in the `sessionid` cookie. The data
//! lives in a [`SessionStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub type SessionId = String;

/// Session key holding the authenticated user's id.
pub const SESSION_KEY_USER_ID: &str = "_auth_user_id";

/// Session key holding queued flash messages.
pub const SESSION_KEY_MESSAGES: &str = "_messages";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	#[error("Session I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Session serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("Invalid session id")]
	InvalidId,
}

impl From<SessionError> for campus_core::Error {
	fn from(err: SessionError) -> Self {
		campus_core::Error::Internal(err.to_string())
	}
}

/// Key/value data stored for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
	pub data: HashMap<String, serde_json::Value>,
}

impl SessionData {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
		self.data.insert(key.into(), value);
	}

	pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
		self.data.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
		self.data.remove(key)
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn clear(&mut self) {
		self.data.clear();
	}
}

#[async_trait]
pub trait SessionStore: Send + Sync {
	/// `Ok(None)` for an unknown or deleted id.
	async fn load(&self, session_id: &str) -> Result<Option<SessionData>, SessionError>;

	async fn save(&self, session_id: &str, session: &SessionData) -> Result<(), SessionError>;

	/// Deleting an unknown id is not an error.
	async fn delete(&self, session_id: &str) -> Result<(), SessionError>;

	fn create_session_id(&self) -> SessionId {
		Uuid::new_v4().simple().to_string()
	}
}

/// Whether `id` has the shape of an id produced by
/// [`SessionStore::create_session_id`].
pub fn is_valid_session_id(id: &str) -> bool {
	id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
	sessions: Arc<Mutex<HashMap<SessionId, SessionData>>>,
}

impl InMemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn len(&self) -> usize {
		self.sessions.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.sessions.lock().await.is_empty()
	}
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
	async fn load(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
		Ok(self.sessions.lock().await.get(session_id).cloned())
	}

	async fn save(&self, session_id: &str, session: &SessionData) -> Result<(), SessionError> {
		self.sessions
			.lock()
			.await
			.insert(session_id.to_string(), session.clone());
		Ok(())
	}

	async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
		self.sessions.lock().await.remove(session_id);
		Ok(())
	}
}

/// One JSON file per session under a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
	dir: PathBuf,
}

impl FileSessionStore {
	/// Use `dir` for session files, creating it if needed.
	pub async fn new(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
		let dir = dir.as_ref().to_path_buf();
		tokio::fs::create_dir_all(&dir).await?;
		Ok(Self { dir })
	}

	fn path_for(&self, session_id: &str) -> Result<PathBuf, SessionError> {
		if !is_valid_session_id(session_id) {
			return Err(SessionError::InvalidId);
		}
		Ok(self.dir.join(format!("{}.json", session_id)))
	}
}

#[async_trait]
impl SessionStore for FileSessionStore {
	async fn load(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
		let path = self.path_for(session_id)?;
		match tokio::fs::read(&path).await {
			Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	async fn save(&self, session_id: &str, session: &SessionData) -> Result<(), SessionError> {
		let path = self.path_for(session_id)?;
		let tmp = path.with_extension("json.tmp");
		tokio::fs::write(&tmp, serde_json::to_vec(session)?).await?;
		tokio::fs::rename(&tmp, &path).await?;
		Ok(())
	}

	async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
		let path = self.path_for(session_id)?;
		match tokio::fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}
