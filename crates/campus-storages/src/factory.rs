//! Factory function for creating storage backends.

use crate::{MediaStorage, Result, StorageConfig};
use std::sync::Arc;

/// Create a storage backend from configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use campus_storages::config::LocalConfig;
/// use campus_storages::{StorageConfig, create_storage};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StorageConfig::Local(LocalConfig {
///         base_path: "/var/lib/campus-hub/media".into(),
///         base_url: "http://localhost:8000/media".into(),
///     });
///     let storage = create_storage(config).await?;
///     storage.check_connection().await?;
///     Ok(())
/// }
/// ```
pub async fn create_storage(config: StorageConfig) -> Result<Arc<dyn MediaStorage>> {
	match config {
		#[cfg(feature = "supabase")]
		StorageConfig::Supabase(supabase_config) => {
			let storage = crate::backends::supabase::SupabaseStorage::new(supabase_config)?;
			Ok(Arc::new(storage))
		}
		StorageConfig::Local(local_config) => {
			let storage = crate::backends::local::LocalStorage::new(local_config)?;
			Ok(Arc::new(storage))
		}
		StorageConfig::Memory => Ok(Arc::new(crate::backends::memory::MemoryStorage::new())),
	}
}
