//! # campus-storages
//!
//! Media storage for item images.
//!
//! Uploads go through the [`MediaStorage`] trait and always yield an
//! [`UploadOutcome`]: either the public URL of the stored object or the
//! reason it was rejected. Provider specific errors never cross this
//! boundary.
//!
//! ## Backends
//!
//! - **Supabase** (`supabase` feature): Supabase Storage REST API
//! - **Local**: files under a directory, served from a configured base URL
//! - **Memory**: kept in process, for tests
//!
//! ## Example
//!
//! ```rust
//! use campus_storages::{MediaStorage, StorageConfig, UploadOutcome, create_storage};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = create_storage(StorageConfig::Memory).await?;
//!
//! let outcome = storage
//!     .upload("lostfound", "3f2a_wallet.jpg", b"\xFF\xD8\xFF", "image/jpeg")
//!     .await;
//!
//! assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod factory;

pub use backend::{MediaStorage, UploadOutcome, guess_content_type, unique_object_name};
pub use config::{BackendType, StorageConfig};
pub use error::{Result, StorageError};
pub use factory::create_storage;
