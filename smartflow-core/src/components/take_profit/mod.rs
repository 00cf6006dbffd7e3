//! Take-profit determination.
//!
//! - [`RiskRewardTakeProfit`]: target at a multiple of the stop distance
//! - [`PercentageTakeProfit`]: fixed fraction away from entry

pub mod percentage;
pub mod risk_reward;

pub use percentage::PercentageTakeProfit;
pub use risk_reward::RiskRewardTakeProfit;

use crate::domain::PriceContext;

/// Trait for take-profit determiners.
pub trait TakeProfitDeterminer: Send + Sync {
    fn name(&self) -> &str;

    /// Target price given the context and the already computed stop.
    fn calculate(&self, ctx: &PriceContext, stop_loss: f64) -> f64;
}
