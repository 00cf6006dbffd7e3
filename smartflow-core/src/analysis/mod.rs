//! Pattern detection over candle slices.
//!
//! Every detector here is a total function: too little data means "nothing
//! found" (`None`, empty vectors, `Sideways`), never an error.
//!
//! - [`structure`]: swings, trend, BOS / CHoCH
//! - [`zones`]: fair value gaps and order blocks
//! - [`liquidity`]: equal levels, premium/discount, sweeps, displacement
//! - [`range`]: range statistics shared by the above

pub mod liquidity;
pub mod range;
pub mod structure;
pub mod zones;

pub use liquidity::{
    detect_displacement, detect_sweep, find_displacement, find_equal_levels, premium_discount,
    Displacement, EqualLevels, LiquidityAnalyzer, LiquidityLevel, LiquiditySnapshot, PriceZone,
    Sweep,
};
pub use range::{average_range, average_true_range, true_range};
pub use structure::{
    classify_trend, detect_swings, MarketStructureTracker, StructureUpdate, Swings,
};
pub use zones::{detect_fvg, detect_order_block, ZoneDetector, ZoneScan};
