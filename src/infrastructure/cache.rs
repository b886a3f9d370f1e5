pub mod invalidation;
pub mod tagged;

pub use invalidation::{FanOutInvalidator, LocalInvalidator, PeerInvalidator, TagInvalidator};
pub use tagged::{CacheKey, TaggedCache};
