mod moka;
mod null;

pub use self::moka::MokaObjectCache;
pub use null::NullObjectCache;
