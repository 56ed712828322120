mod composite;
pub mod negative_cache;
pub mod object_cache;
pub mod traits;

pub use composite::LinkCache;
pub use traits::{CacheResult, NegativeCache, ObjectCache};
