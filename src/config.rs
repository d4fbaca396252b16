//! Project configuration: settings loading, the URL table and the
//! middleware stack.

pub mod media;
pub mod middleware;
pub mod settings;
pub mod urls;
