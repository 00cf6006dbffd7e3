//! Percentage stop-loss.
//!
//! For longs: stop = entry * (1 - stop_pct).
//! For shorts: stop = entry * (1 + stop_pct).

use crate::domain::{PriceContext, Side};

use super::StopLossDeterminer;

#[derive(Debug, Clone)]
pub struct PercentageStopLoss {
    /// Stop distance as a fraction (e.g., 0.01 for 1%).
    pub stop_pct: f64,
}

impl PercentageStopLoss {
    pub fn new(stop_pct: f64) -> Self {
        assert!(stop_pct > 0.0, "stop_pct must be positive");
        assert!(stop_pct < 1.0, "stop_pct must be < 1.0");
        Self { stop_pct }
    }
}

impl StopLossDeterminer for PercentageStopLoss {
    fn name(&self) -> &str {
        "percentage"
    }

    fn calculate(&self, ctx: &PriceContext) -> f64 {
        match ctx.side {
            Side::Long => ctx.entry_price * (1.0 - self.stop_pct),
            Side::Short => ctx.entry_price * (1.0 + self.stop_pct),
        }
    }
}
