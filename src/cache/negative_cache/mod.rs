mod moka;
mod null;

pub use self::moka::MokaNegativeCache;
pub use null::NullNegativeCache;
