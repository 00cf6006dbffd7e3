use crate::domain::{PriceContext, Side};

use super::TakeProfitDeterminer;

/// Target a fixed fraction away from entry, ignoring the stop.
#[derive(Debug, Clone)]
pub struct PercentageTakeProfit {
    /// Target distance as a fraction (e.g., 0.02 for 2%).
    pub target_pct: f64,
}

impl PercentageTakeProfit {
    pub fn new(target_pct: f64) -> Self {
        assert!(target_pct > 0.0, "target_pct must be positive");
        assert!(target_pct < 1.0, "target_pct must be < 1.0");
        Self { target_pct }
    }
}

impl TakeProfitDeterminer for PercentageTakeProfit {
    fn name(&self) -> &str {
        "percentage"
    }

    fn calculate(&self, ctx: &PriceContext, _stop_loss: f64) -> f64 {
        match ctx.side {
            Side::Long => ctx.entry_price * (1.0 + self.target_pct),
            Side::Short => ctx.entry_price * (1.0 - self.target_pct),
        }
    }
}
