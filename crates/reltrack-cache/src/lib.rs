// Response cache for gateway results
// Lives in memory for one session; a restart always starts cold

pub mod cache;

pub use cache::{CacheError, CacheManager};
