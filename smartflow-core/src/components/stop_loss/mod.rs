//! Stop-loss determination.
//!
//! - [`PercentageStopLoss`]: fixed fraction away from entry
//! - [`ZoneBasedStopLoss`]: beyond the entry zone, then the sweep, then a fixed fraction

pub mod percentage;
pub mod zone_based;

pub use percentage::PercentageStopLoss;
pub use zone_based::ZoneBasedStopLoss;

use crate::domain::PriceContext;

/// Trait for stop-loss determiners.
///
/// Implementations only compute a price. Ordering against entry and target is
/// enforced once, by [`Signal::new`](crate::domain::Signal::new).
pub trait StopLossDeterminer: Send + Sync {
    fn name(&self) -> &str;

    fn calculate(&self, ctx: &PriceContext) -> f64;
}
