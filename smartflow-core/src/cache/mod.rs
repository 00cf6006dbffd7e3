//! Feature caching: bounded zone stores plus the live structure slot.
//!
//! - [`BoundedFifo`]: fixed-capacity FIFO with unconditional oldest-eviction
//! - [`FeatureStateCache`]: per-interval zones + structure, incremental update

pub mod bounded;
pub mod feature;

pub use bounded::BoundedFifo;
pub use feature::{FeatureStateCache, UpdateReport};

/// Default number of cached order blocks per interval.
pub const DEFAULT_MAX_ORDER_BLOCKS: usize = 20;

/// Default number of cached fair value gaps per interval.
pub const DEFAULT_MAX_FVGS: usize = 10;
