//! Entry determination: decides whether the cached features justify a trade.
//!
//! Entry determiners are stateless: they receive a [`MarketContext`] snapshot
//! assembled by the engine from the role-resolved intervals and never see
//! buffers or caches directly.

pub mod gating;
pub mod smart_money;

pub use gating::{ConditionWeights, EntryConditions, GatingPolicy, ScorePolicy};
pub use smart_money::SmartMoneyEntry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{Displacement, Sweep};
use crate::domain::{EntryDecision, FairValueGap, OrderBlock, Trend};

/// Feature snapshot handed to an entry determiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub symbol: String,
    /// Close time of the candle being evaluated.
    pub timestamp: DateTime<Utc>,
    /// Latest close of the entry interval.
    pub price: f64,
    /// Trend of the trend-role interval.
    pub trend: Trend,
    /// Dealing range `(low, high)` of the trend-role interval.
    pub range: Option<(f64, f64)>,
    /// Active (non-mitigated) blocks of the zone-role interval.
    pub order_blocks: Vec<OrderBlock>,
    /// Active (unfilled) gaps of the zone-role interval.
    pub fvgs: Vec<FairValueGap>,
    pub sweep: Option<Sweep>,
    pub displacement: Option<Displacement>,
}

/// Trait for entry determiners.
pub trait EntryDeterminer: Send + Sync {
    /// Human-readable name (e.g., "smart_money").
    fn name(&self) -> &str;

    /// Returns `Some(EntryDecision)` when the context justifies an entry.
    fn analyze(&self, ctx: &MarketContext) -> Option<EntryDecision>;
}
