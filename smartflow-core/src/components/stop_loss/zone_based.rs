//! Zone-based stop-loss: invalidation just beyond the structure that
//! justified the entry.
//!
//! Candidates, in order: the entry zone's far edge, the sweep wick extreme,
//! then a fixed fraction of entry. A candidate on the wrong side of entry is
//! skipped.

use crate::domain::{PriceContext, Side};

use super::StopLossDeterminer;

#[derive(Debug, Clone)]
pub struct ZoneBasedStopLoss {
    /// Extra distance beyond the anchor, as a fraction of the anchor price.
    pub buffer_pct: f64,
    /// Fraction of entry used when no anchor is usable.
    pub fallback_pct: f64,
}

impl ZoneBasedStopLoss {
    pub fn new(buffer_pct: f64, fallback_pct: f64) -> Self {
        assert!(buffer_pct >= 0.0, "buffer_pct must be non-negative");
        assert!(buffer_pct < 1.0, "buffer_pct must be < 1.0");
        assert!(fallback_pct > 0.0, "fallback_pct must be positive");
        assert!(fallback_pct < 1.0, "fallback_pct must be < 1.0");
        Self {
            buffer_pct,
            fallback_pct,
        }
    }

    fn beyond(&self, side: Side, anchor: f64) -> f64 {
        match side {
            Side::Long => anchor * (1.0 - self.buffer_pct),
            Side::Short => anchor * (1.0 + self.buffer_pct),
        }
    }
}

impl StopLossDeterminer for ZoneBasedStopLoss {
    fn name(&self) -> &str {
        "zone_based"
    }

    fn calculate(&self, ctx: &PriceContext) -> f64 {
        let entry = ctx.entry_price;
        let zone_edge = ctx.zone_bounds().map(|(low, high)| match ctx.side {
            Side::Long => low,
            Side::Short => high,
        });
        let protective = |stop: &f64| match ctx.side {
            Side::Long => *stop < entry,
            Side::Short => *stop > entry,
        };

        zone_edge
            .map(|edge| self.beyond(ctx.side, edge))
            .filter(protective)
            .or_else(|| {
                ctx.sweep_level()
                    .map(|level| self.beyond(ctx.side, level))
                    .filter(protective)
            })
            .unwrap_or_else(|| match ctx.side {
                Side::Long => entry * (1.0 - self.fallback_pct),
                Side::Short => entry * (1.0 + self.fallback_pct),
            })
    }
}
