//! Smart-money entry: trend, premium/discount, zone confluence, sweep, displacement.
//!
//! Long setups need a bullish trend with price in the discount half of the
//! dealing range; shorts mirror that in premium. The decision carries the
//! nearest agreeing zone, the displacement size and the sweep extreme so the
//! stop-loss and take-profit determiners can anchor on them.

use tracing::debug;

use crate::analysis::{premium_discount, PriceZone};
use crate::domain::{Direction, EntryDecision, PriceExtra};

use super::gating::{EntryConditions, GatingPolicy};
use super::{EntryDeterminer, MarketContext};

#[derive(Debug, Clone, Default)]
pub struct SmartMoneyEntry {
    pub gating: GatingPolicy,
}

impl SmartMoneyEntry {
    pub fn new(gating: GatingPolicy) -> Self {
        Self { gating }
    }

    /// Evaluate every condition for a trade in `direction`.
    pub fn conditions(&self, ctx: &MarketContext, direction: Direction) -> EntryConditions {
        let wanted = match direction {
            Direction::Bullish => PriceZone::Discount,
            Direction::Bearish => PriceZone::Premium,
        };
        EntryConditions {
            trending: ctx.trend.direction() == Some(direction),
            in_zone: ctx
                .range
                .is_some_and(|(low, high)| premium_discount(low, high, ctx.price) == wanted),
            zone_confluence: nearest_zone(ctx, direction).is_some(),
            sweep: ctx.sweep.is_some_and(|s| s.direction == direction),
            displacement: ctx.displacement.is_some_and(|d| d.direction == direction),
        }
    }
}

/// Bounds of the agreeing zone closest to price. Order blocks take precedence
/// over fair value gaps.
fn nearest_zone(ctx: &MarketContext, direction: Direction) -> Option<(f64, f64)> {
    let distance = |(low, high): (f64, f64)| {
        if ctx.price < low {
            low - ctx.price
        } else if ctx.price > high {
            ctx.price - high
        } else {
            0.0
        }
    };
    let closest = |zones: Vec<(f64, f64)>| {
        zones
            .into_iter()
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
    };

    let blocks: Vec<(f64, f64)> = ctx
        .order_blocks
        .iter()
        .filter(|ob| ob.direction == direction && !ob.mitigated)
        .map(|ob| (ob.low, ob.high))
        .collect();
    closest(blocks).or_else(|| {
        let gaps: Vec<(f64, f64)> = ctx
            .fvgs
            .iter()
            .filter(|fvg| fvg.direction == direction && !fvg.filled)
            .map(|fvg| (fvg.gap_low, fvg.gap_high))
            .collect();
        closest(gaps)
    })
}

impl EntryDeterminer for SmartMoneyEntry {
    fn name(&self) -> &str {
        "smart_money"
    }

    fn analyze(&self, ctx: &MarketContext) -> Option<EntryDecision> {
        let direction = ctx.trend.direction()?;
        let conditions = self.conditions(ctx, direction);
        if !self.gating.admits(&conditions) {
            debug!(symbol = %ctx.symbol, ?conditions, "entry conditions not met");
            return None;
        }

        let mut extras = Vec::new();
        if let Some((low, high)) = nearest_zone(ctx, direction) {
            extras.push(PriceExtra::ZoneBounds { low, high });
        }
        if let Some(d) = ctx.displacement.filter(|d| d.direction == direction) {
            extras.push(PriceExtra::DisplacementSize { size: d.range });
        }
        if let Some(s) = ctx.sweep.filter(|s| s.direction == direction) {
            extras.push(PriceExtra::SweepLevel { level: s.extreme });
        }

        Some(EntryDecision {
            side: direction.side(),
            entry_price: ctx.price,
            extras,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Displacement, Sweep};
    use crate::components::entry::gating::{ConditionWeights, ScorePolicy};
    use crate::domain::{FairValueGap, OrderBlock, Side, SwingKind, Trend};
    use chrono::{DateTime, TimeZone, Utc};

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
    }

    fn ob(low: f64, high: f64, direction: Direction) -> OrderBlock {
        OrderBlock {
            anchor_time: t(),
            formed_at: t(),
            low,
            high,
            direction,
            displacement_ratio: 3.0,
            mitigated: false,
        }
    }

    /// Bullish setup satisfying every condition.
    fn long_setup() -> MarketContext {
        MarketContext {
            symbol: "BTCUSDT".into(),
            timestamp: t(),
            price: 102.0,
            trend: Trend::Bullish,
            range: Some((100.0, 110.0)),
            order_blocks: vec![ob(95.0, 97.0, Direction::Bullish), ob(100.0, 101.5, Direction::Bullish)],
            fvgs: vec![],
            sweep: Some(Sweep {
                side_swept: SwingKind::Low,
                direction: Direction::Bullish,
                level: 100.0,
                extreme: 99.2,
                time: t(),
                confirmed_at: t(),
            }),
            displacement: Some(Displacement {
                direction: Direction::Bullish,
                range: 3.5,
                time: t(),
            }),
        }
    }

    #[test]
    fn full_setup_goes_long_with_extras() {
        let entry = SmartMoneyEntry::default();
        let decision = entry.analyze(&long_setup()).unwrap();
        assert_eq!(decision.side, Side::Long);
        assert_eq!(decision.entry_price, 102.0);
        assert_eq!(
            decision.extras,
            vec![
                PriceExtra::ZoneBounds {
                    low: 100.0,
                    high: 101.5
                },
                PriceExtra::DisplacementSize { size: 3.5 },
                PriceExtra::SweepLevel { level: 99.2 },
            ]
        );
    }

    #[test]
    fn sideways_never_enters() {
        let mut ctx = long_setup();
        ctx.trend = Trend::Sideways;
        assert!(SmartMoneyEntry::default().analyze(&ctx).is_none());
    }

    #[test]
    fn premium_price_blocks_long() {
        let mut ctx = long_setup();
        ctx.price = 106.0;
        assert!(SmartMoneyEntry::default().analyze(&ctx).is_none());
    }

    #[test]
    fn opposing_zones_do_not_count() {
        let mut ctx = long_setup();
        ctx.order_blocks = vec![ob(100.0, 101.0, Direction::Bearish)];
        assert!(SmartMoneyEntry::default().analyze(&ctx).is_none());

        ctx.fvgs = vec![FairValueGap {
            anchor_time: t(),
            formed_at: t(),
            gap_low: 98.0,
            gap_high: 99.0,
            direction: Direction::Bullish,
            filled: false,
        }];
        let decision = SmartMoneyEntry::default().analyze(&ctx).unwrap();
        assert_eq!(
            decision.extras[0],
            PriceExtra::ZoneBounds {
                low: 98.0,
                high: 99.0
            }
        );
    }

    #[test]
    fn misaligned_sweep_fails_conjunctive_but_passes_weighted() {
        let mut ctx = long_setup();
        if let Some(s) = ctx.sweep.as_mut() {
            s.direction = Direction::Bearish;
        }
        assert!(SmartMoneyEntry::default().analyze(&ctx).is_none());

        let weighted = SmartMoneyEntry::new(GatingPolicy::WeightedScore(ScorePolicy {
            version: 1,
            weights: ConditionWeights::default(),
            threshold: 3.0,
        }));
        let decision = weighted.analyze(&ctx).unwrap();
        assert!(!decision
            .extras
            .iter()
            .any(|e| matches!(e, PriceExtra::SweepLevel { .. })));
    }

    #[test]
    fn bearish_setup_goes_short() {
        let ctx = MarketContext {
            symbol: "BTCUSDT".into(),
            timestamp: t(),
            price: 108.0,
            trend: Trend::Bearish,
            range: Some((100.0, 110.0)),
            order_blocks: vec![ob(108.5, 109.5, Direction::Bearish)],
            fvgs: vec![],
            sweep: Some(Sweep {
                side_swept: SwingKind::High,
                direction: Direction::Bearish,
                level: 109.8,
                extreme: 110.4,
                time: t(),
                confirmed_at: t(),
            }),
            displacement: Some(Displacement {
                direction: Direction::Bearish,
                range: 2.0,
                time: t(),
            }),
        };
        let decision = SmartMoneyEntry::default().analyze(&ctx).unwrap();
        assert_eq!(decision.side, Side::Short);
    }
}
