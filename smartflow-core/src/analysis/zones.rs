//! Zone detection: fair value gaps and order blocks.
//!
//! Both patterns are confirmable from a small, bounded lookback: an FVG needs
//! three candles, an order block needs the displacement run plus the candles
//! used to measure the average range. The recent pass therefore only looks at
//! patterns that end at the newest candle, and the historical pass applies
//! the exact same windows once over the backfilled buffer.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction, FairValueGap, OrderBlock};

use super::range::average_range;

/// Detect a fair value gap in the last three candles of `candles`.
///
/// Bullish iff `c0.high < c2.low`, bearish iff `c0.low > c2.high`. Gaps
/// smaller than `min_gap_pct` percent of the middle candle's close are noise.
pub fn detect_fvg(candles: &[Candle], min_gap_pct: f64) -> Option<FairValueGap> {
    if candles.len() < 3 {
        return None;
    }
    let [c0, c1, c2] = &candles[candles.len() - 3..] else {
        return None;
    };
    if c1.close <= 0.0 || c0.is_void() || c2.is_void() {
        return None;
    }

    let (gap_low, gap_high, direction) = if c0.high < c2.low {
        (c0.high, c2.low, Direction::Bullish)
    } else if c0.low > c2.high {
        (c2.high, c0.low, Direction::Bearish)
    } else {
        return None;
    };

    if (gap_high - gap_low) / c1.close * 100.0 < min_gap_pct {
        return None;
    }

    Some(FairValueGap {
        anchor_time: c1.open_time,
        formed_at: c2.open_time,
        gap_low,
        gap_high,
        direction,
        filled: false,
    })
}

/// Detect an order block whose displacement move ends at the newest candle.
///
/// The move is the run of same-colored candles ending at the newest candle
/// (at most `max_move_candles`). The candle right before the run must be of
/// the opposite color; it becomes the block. The move's range divided by the
/// average range of the candles before the run is the displacement ratio and
/// must reach `displacement_ratio_threshold`. `min_strength` bounds the net
/// body of the move relative to its full extent, and the move has to close
/// beyond the block.
pub fn detect_order_block(
    window: &[Candle],
    displacement_ratio_threshold: f64,
    min_strength: f64,
    max_move_candles: usize,
) -> Option<OrderBlock> {
    let n = window.len();
    if n < 2 || max_move_candles == 0 {
        return None;
    }
    let last = &window[n - 1];
    let direction = if last.is_bullish() {
        Direction::Bullish
    } else if last.is_bearish() {
        Direction::Bearish
    } else {
        return None;
    };
    let same_color = |c: &Candle| match direction {
        Direction::Bullish => c.is_bullish(),
        Direction::Bearish => c.is_bearish(),
    };

    let mut run_start = n - 1;
    while run_start > 0 && n - run_start < max_move_candles && same_color(&window[run_start - 1]) {
        run_start -= 1;
    }
    if run_start == 0 {
        return None;
    }

    let block = &window[run_start - 1];
    let opposite = match direction {
        Direction::Bullish => block.is_bearish(),
        Direction::Bearish => block.is_bullish(),
    };
    if !opposite {
        return None;
    }

    let baseline = average_range(&window[..run_start])?;
    if baseline <= 0.0 {
        return None;
    }

    let run = &window[run_start..];
    let move_high = run.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let move_low = run.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let move_range = move_high - move_low;
    if move_range <= 0.0 {
        return None;
    }

    let displacement_ratio = move_range / baseline;
    if displacement_ratio < displacement_ratio_threshold {
        return None;
    }

    let strength = (last.close - run[0].open).abs() / move_range;
    if strength < min_strength {
        return None;
    }

    let closes_beyond = match direction {
        Direction::Bullish => last.close > block.high,
        Direction::Bearish => last.close < block.low,
    };
    if !closes_beyond {
        return None;
    }

    Some(OrderBlock {
        anchor_time: block.open_time,
        formed_at: last.open_time,
        low: block.low,
        high: block.high,
        direction,
        displacement_ratio,
        mitigated: false,
    })
}

/// Zones found by one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneScan {
    pub order_blocks: Vec<OrderBlock>,
    pub fvgs: Vec<FairValueGap>,
}

/// Zone detector configured with the detection thresholds.
#[derive(Debug, Clone)]
pub struct ZoneDetector {
    fvg_min_gap_pct: f64,
    displacement_ratio_threshold: f64,
    ob_min_strength: f64,
    max_move_candles: usize,
    average_range_window: usize,
}

impl ZoneDetector {
    pub fn new(
        fvg_min_gap_pct: f64,
        displacement_ratio_threshold: f64,
        ob_min_strength: f64,
        max_move_candles: usize,
        average_range_window: usize,
    ) -> Self {
        assert!(fvg_min_gap_pct >= 0.0, "fvg_min_gap_pct must be non-negative");
        assert!(
            displacement_ratio_threshold > 0.0,
            "displacement_ratio_threshold must be positive"
        );
        assert!(max_move_candles >= 1, "max_move_candles must be >= 1");
        assert!(average_range_window >= 1, "average_range_window must be >= 1");
        Self {
            fvg_min_gap_pct,
            displacement_ratio_threshold,
            ob_min_strength,
            max_move_candles,
            average_range_window,
        }
    }

    /// Number of newest candles [`scan_recent`](Self::scan_recent) needs.
    pub fn window(&self) -> usize {
        (self.average_range_window + self.max_move_candles + 1).max(3)
    }

    /// Detect zones completed by the newest candle of `recent`.
    ///
    /// Only the last [`window`](Self::window) candles are examined.
    pub fn scan_recent(&self, recent: &[Candle]) -> ZoneScan {
        let start = recent.len().saturating_sub(self.window());
        let tail = &recent[start..];
        let mut scan = ZoneScan::default();
        if let Some(ob) = detect_order_block(
            tail,
            self.displacement_ratio_threshold,
            self.ob_min_strength,
            self.max_move_candles,
        ) {
            scan.order_blocks.push(ob);
        }
        if let Some(fvg) = detect_fvg(tail, self.fvg_min_gap_pct) {
            scan.fvgs.push(fvg);
        }
        scan
    }

    /// Apply both detectors at every position of the full buffer.
    ///
    /// Returns zones in the order they formed. A block reported again by a
    /// longer run of the same move is kept once.
    pub fn scan_historical(&self, candles: &[Candle]) -> (Vec<OrderBlock>, Vec<FairValueGap>) {
        let mut order_blocks: Vec<OrderBlock> = Vec::new();
        let mut fvgs = Vec::new();
        for end in 0..candles.len() {
            let scan = self.scan_recent(&candles[..=end]);
            for ob in scan.order_blocks {
                let seen = order_blocks
                    .iter()
                    .any(|o| o.anchor_time == ob.anchor_time && o.direction == ob.direction);
                if !seen {
                    order_blocks.push(ob);
                }
            }
            fvgs.extend(scan.fvgs);
        }
        (order_blocks, fvgs)
    }
}
