use crate::domain::{PriceContext, Side};

use super::TakeProfitDeterminer;

/// Target = entry ± ratio × |entry − stop|.
#[derive(Debug, Clone)]
pub struct RiskRewardTakeProfit {
    pub ratio: f64,
}

impl RiskRewardTakeProfit {
    pub fn new(ratio: f64) -> Self {
        assert!(ratio > 0.0, "ratio must be positive");
        Self { ratio }
    }
}

impl TakeProfitDeterminer for RiskRewardTakeProfit {
    fn name(&self) -> &str {
        "risk_reward"
    }

    fn calculate(&self, ctx: &PriceContext, stop_loss: f64) -> f64 {
        let risk = (ctx.entry_price - stop_loss).abs();
        match ctx.side {
            Side::Long => ctx.entry_price + risk * self.ratio,
            Side::Short => ctx.entry_price - risk * self.ratio,
        }
    }
}
