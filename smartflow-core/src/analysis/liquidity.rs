//! Liquidity analysis: equal highs/lows, premium/discount, sweeps, displacement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction, SwingKind};

use super::range::true_range;
use super::structure::detect_swings;

/// A cluster of swing extremes at (nearly) the same price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityLevel {
    pub kind: SwingKind,
    /// Mean price of the clustered swings.
    pub price: f64,
    pub touches: usize,
    pub first_time: DateTime<Utc>,
    pub last_time: DateTime<Utc>,
}

/// Buy-side (`highs`) and sell-side (`lows`) liquidity pools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqualLevels {
    pub highs: Vec<LiquidityLevel>,
    pub lows: Vec<LiquidityLevel>,
}

impl EqualLevels {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }
}

/// Group swing highs and swing lows whose prices sit within `tolerance_pct`
/// of each other. Clusters with fewer than two touches are not levels.
pub fn find_equal_levels(candles: &[Candle], tolerance_pct: f64, swing_lookback: usize) -> EqualLevels {
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    for swing in detect_swings(candles, swing_lookback) {
        match swing.kind {
            SwingKind::High => highs.push((swing.price, swing.time)),
            SwingKind::Low => lows.push((swing.price, swing.time)),
        }
    }
    EqualLevels {
        highs: cluster(highs, tolerance_pct, SwingKind::High),
        lows: cluster(lows, tolerance_pct, SwingKind::Low),
    }
}

/// Greedy clustering over price-sorted points: a point joins the open cluster
/// while it stays within tolerance of the cluster's lowest price.
fn cluster(
    mut points: Vec<(f64, DateTime<Utc>)>,
    tolerance_pct: f64,
    kind: SwingKind,
) -> Vec<LiquidityLevel> {
    points.retain(|(price, _)| price.is_finite() && *price > 0.0);
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut levels = Vec::new();
    let mut start = 0;
    while start < points.len() {
        let base = points[start].0;
        let mut end = start + 1;
        while end < points.len() && (points[end].0 - base) / base * 100.0 <= tolerance_pct {
            end += 1;
        }
        let group = &points[start..end];
        if group.len() >= 2 {
            let sum: f64 = group.iter().map(|(p, _)| p).sum();
            let first_time = group.iter().map(|(_, t)| *t).min().unwrap_or(group[0].1);
            let last_time = group.iter().map(|(_, t)| *t).max().unwrap_or(group[0].1);
            levels.push(LiquidityLevel {
                kind,
                price: sum / group.len() as f64,
                touches: group.len(),
                first_time,
                last_time,
            });
        }
        start = end;
    }
    levels
}

/// Position of price within a dealing range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceZone {
    Premium,
    Discount,
}

/// `Discount` strictly below the midpoint of `[range_low, range_high]`, else `Premium`.
pub fn premium_discount(range_low: f64, range_high: f64, price: f64) -> PriceZone {
    let mid = (range_low + range_high) / 2.0;
    if price < mid {
        PriceZone::Discount
    } else {
        PriceZone::Premium
    }
}

/// A wick through a liquidity level that closed back on the original side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    /// Which pool was taken: highs (buy-side) or lows (sell-side).
    pub side_swept: SwingKind,
    /// Intent implied by the sweep: sell-side sweeps are bullish.
    pub direction: Direction,
    pub level: f64,
    /// Wick extreme of the sweeping candle.
    pub extreme: f64,
    /// Open time of the sweeping candle.
    pub time: DateTime<Utc>,
    /// Open time of the candle that closed back across the level.
    pub confirmed_at: DateTime<Utc>,
}

/// Find the newest sweep of `levels` in `recent` (oldest first).
///
/// Candle `i` must pierce a level formed before it and candle `i + 1` must
/// close back on the original side of that level.
pub fn detect_sweep(levels: &EqualLevels, recent: &[Candle]) -> Option<Sweep> {
    if recent.len() < 2 {
        return None;
    }
    for i in (0..recent.len() - 1).rev() {
        let candle = &recent[i];
        let next = &recent[i + 1];
        let formed_before = |level: &&LiquidityLevel| level.last_time < candle.open_time;

        let high = levels
            .highs
            .iter()
            .filter(formed_before)
            .find(|level| candle.high > level.price && next.close < level.price);
        if let Some(level) = high {
            return Some(Sweep {
                side_swept: SwingKind::High,
                direction: Direction::Bearish,
                level: level.price,
                extreme: candle.high,
                time: candle.open_time,
                confirmed_at: next.open_time,
            });
        }

        let low = levels
            .lows
            .iter()
            .filter(formed_before)
            .find(|level| candle.low < level.price && next.close > level.price);
        if let Some(level) = low {
            return Some(Sweep {
                side_swept: SwingKind::Low,
                direction: Direction::Bullish,
                level: level.price,
                extreme: candle.low,
                time: candle.open_time,
                confirmed_at: next.open_time,
            });
        }
    }
    None
}

/// A single candle whose true range dwarfs the average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub direction: Direction,
    pub range: f64,
    pub time: DateTime<Utc>,
}

/// Newest candle of `recent` whose true range exceeds `atr_multiplier` times
/// the average true range of the slice. Dojis carry no direction and are skipped.
pub fn find_displacement(recent: &[Candle], atr_multiplier: f64) -> Option<Displacement> {
    let tr = true_range(recent);
    if tr.is_empty() || tr.iter().any(|v| v.is_nan()) {
        return None;
    }
    let atr = tr.iter().sum::<f64>() / tr.len() as f64;
    if atr <= 0.0 {
        return None;
    }
    let threshold = atr * atr_multiplier;

    recent.iter().zip(&tr).rev().find_map(|(candle, &range)| {
        if range <= threshold {
            return None;
        }
        let direction = if candle.is_bullish() {
            Direction::Bullish
        } else if candle.is_bearish() {
            Direction::Bearish
        } else {
            return None;
        };
        Some(Displacement {
            direction,
            range,
            time: candle.open_time,
        })
    })
}

pub fn detect_displacement(recent: &[Candle], atr_multiplier: f64) -> bool {
    find_displacement(recent, atr_multiplier).is_some()
}

/// Liquidity picture of one interval at its newest candle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySnapshot {
    pub levels: EqualLevels,
    pub sweep: Option<Sweep>,
    pub displacement: Option<Displacement>,
}

/// Liquidity analyzer configured with the detection thresholds.
#[derive(Debug, Clone)]
pub struct LiquidityAnalyzer {
    tolerance_pct: f64,
    swing_lookback: usize,
    sweep_window: usize,
    atr_multiplier: f64,
    liquidity_window: usize,
}

impl LiquidityAnalyzer {
    pub fn new(
        tolerance_pct: f64,
        swing_lookback: usize,
        sweep_window: usize,
        atr_multiplier: f64,
        liquidity_window: usize,
    ) -> Self {
        assert!(tolerance_pct >= 0.0, "liquidity tolerance must be non-negative");
        assert!(swing_lookback >= 1, "liquidity swing lookback must be >= 1");
        assert!(sweep_window >= 1, "sweep window must be >= 1");
        assert!(atr_multiplier > 0.0, "atr multiplier must be positive");
        assert!(
            liquidity_window > sweep_window,
            "liquidity window must exceed the sweep window"
        );
        Self {
            tolerance_pct,
            swing_lookback,
            sweep_window,
            atr_multiplier,
            liquidity_window,
        }
    }

    /// Analyze the newest `liquidity_window` candles of `candles`.
    ///
    /// Levels come from the candles before the last `sweep_window + 1`; sweeps
    /// and displacement are only reported inside that recent tail.
    pub fn analyze(&self, candles: &[Candle]) -> LiquiditySnapshot {
        let start = candles.len().saturating_sub(self.liquidity_window);
        let window = &candles[start..];
        let split = window.len().saturating_sub(self.sweep_window + 1);

        let levels = find_equal_levels(&window[..split], self.tolerance_pct, self.swing_lookback);
        let sweep = detect_sweep(&levels, &window[split..]);

        let recent_from = window
            .len()
            .checked_sub(self.sweep_window)
            .map(|i| window[i].open_time);
        let displacement = find_displacement(window, self.atr_multiplier)
            .filter(|d| recent_from.map_or(true, |from| d.time >= from));

        LiquiditySnapshot {
            levels,
            sweep,
            displacement,
        }
    }
}
