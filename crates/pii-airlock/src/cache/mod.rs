mod store;

pub use store::{CacheKeyInput, CacheStats, ResponseCache};
