//! Storage backend implementations.

pub mod local;
pub mod memory;
#[cfg(feature = "supabase")]
pub mod supabase;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "supabase")]
pub use supabase::SupabaseStorage;
