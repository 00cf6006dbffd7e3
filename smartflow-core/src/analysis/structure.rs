//! Market structure tracking: swings, trend classification, BOS / CHoCH.
//!
//! A candle at position `i` is a swing high iff its high strictly exceeds the
//! highs of the `lookback` candles on each side (mirror for swing lows), so a
//! swing is only confirmed `lookback` candles after it prints.
//!
//! The live path ([`MarketStructureTracker::advance`]) looks at the newest
//! `2 * lookback + 1` candles only. The historical pass replays the same step
//! over the whole buffer so both paths agree on every break.

use crate::domain::{
    Candle, Direction, MarketStructureState, StructureEvent, StructureEventKind, SwingKind,
    SwingPoint, Trend,
};

/// Lazy iterator over the swing points of a candle slice.
///
/// Finite and restartable: clone it to iterate again from the same position.
/// A candle that is both a swing high and a swing low yields the high first.
#[derive(Debug, Clone)]
pub struct Swings<'a> {
    candles: &'a [Candle],
    lookback: usize,
    next: usize,
    pending_low: Option<SwingPoint>,
}

impl<'a> Iterator for Swings<'a> {
    type Item = SwingPoint;

    fn next(&mut self) -> Option<SwingPoint> {
        if let Some(low) = self.pending_low.take() {
            return Some(low);
        }
        if self.lookback == 0 {
            return None;
        }
        while self.next + self.lookback < self.candles.len() {
            let i = self.next;
            self.next += 1;
            if i < self.lookback {
                continue;
            }
            let candles = self.candles;
            let high = is_swing(candles, i, self.lookback, SwingKind::High);
            let low = is_swing(candles, i, self.lookback, SwingKind::Low);
            let point = |kind| {
                let candle = &candles[i];
                SwingPoint {
                    index: i,
                    time: candle.open_time,
                    price: match kind {
                        SwingKind::High => candle.high,
                        SwingKind::Low => candle.low,
                    },
                    kind,
                }
            };
            match (high, low) {
                (true, true) => {
                    self.pending_low = Some(point(SwingKind::Low));
                    return Some(point(SwingKind::High));
                }
                (true, false) => return Some(point(SwingKind::High)),
                (false, true) => return Some(point(SwingKind::Low)),
                (false, false) => {}
            }
        }
        None
    }
}

/// Detect swing highs and lows in `candles`.
pub fn detect_swings(candles: &[Candle], lookback: usize) -> Swings<'_> {
    Swings {
        candles,
        lookback,
        next: 0,
        pending_low: None,
    }
}

fn is_swing(candles: &[Candle], i: usize, lookback: usize, kind: SwingKind) -> bool {
    if i < lookback || i + lookback >= candles.len() {
        return false;
    }
    let pivot = &candles[i];
    candles[i - lookback..=i + lookback]
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != lookback)
        .all(|(_, other)| match kind {
            SwingKind::High => pivot.high > other.high,
            SwingKind::Low => pivot.low < other.low,
        })
}

/// Classify trend from a chronological swing sequence.
///
/// A swing high above the previous swing high is a bullish break, a swing low
/// below the previous swing low a bearish break. The trend follows the most
/// recent break; no break at all means sideways.
pub fn classify_trend(swings: impl IntoIterator<Item = SwingPoint>) -> Trend {
    let mut last_high: Option<f64> = None;
    let mut last_low: Option<f64> = None;
    let mut trend = Trend::Sideways;
    for swing in swings {
        match swing.kind {
            SwingKind::High => {
                if matches!(last_high, Some(prev) if swing.price > prev) {
                    trend = Trend::Bullish;
                }
                last_high = Some(swing.price);
            }
            SwingKind::Low => {
                if matches!(last_low, Some(prev) if swing.price < prev) {
                    trend = Trend::Bearish;
                }
                last_low = Some(swing.price);
            }
        }
    }
    trend
}

/// Result of one incremental structure step.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureUpdate {
    pub state: MarketStructureState,
    pub event: Option<StructureEvent>,
    pub new_swings: Vec<SwingPoint>,
}

impl StructureUpdate {
    /// True if the step produced a break or a newly confirmed swing.
    pub fn changed(&self) -> bool {
        self.event.is_some() || !self.new_swings.is_empty()
    }
}

/// Swing and structure-break tracker for one interval.
#[derive(Debug, Clone)]
pub struct MarketStructureTracker {
    lookback: usize,
    break_buffer_pct: f64,
}

impl MarketStructureTracker {
    pub fn new(lookback: usize, break_buffer_pct: f64) -> Self {
        assert!(lookback >= 1, "swing lookback must be >= 1");
        assert!(break_buffer_pct >= 0.0, "break buffer must be non-negative");
        Self {
            lookback,
            break_buffer_pct,
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Number of newest candles the incremental step needs.
    pub fn window(&self) -> usize {
        self.lookback * 2 + 1
    }

    /// Check whether `candle` closes beyond an unbroken recorded swing extreme.
    ///
    /// BOS when the break agrees with the prevailing trend (or the market is
    /// sideways), CHoCH when it goes against it.
    pub fn detect_structure_break(
        &self,
        state: &MarketStructureState,
        candle: &Candle,
    ) -> Option<StructureEvent> {
        let buffer = self.break_buffer_pct / 100.0;
        let broke = |direction: Direction, level: f64| {
            let kind = match (state.trend, direction) {
                (Trend::Bullish, Direction::Bearish) | (Trend::Bearish, Direction::Bullish) => {
                    StructureEventKind::Choch
                }
                _ => StructureEventKind::Bos,
            };
            StructureEvent {
                kind,
                direction,
                level,
                time: candle.open_time,
            }
        };

        if !state.high_broken {
            if let Some(high) = state.last_swing_high {
                if candle.close > high * (1.0 + buffer) {
                    return Some(broke(Direction::Bullish, high));
                }
            }
        }
        if !state.low_broken {
            if let Some(low) = state.last_swing_low {
                if candle.close < low * (1.0 - buffer) {
                    return Some(broke(Direction::Bearish, low));
                }
            }
        }
        None
    }

    /// Advance `state` by the newest candle of `recent` (oldest first).
    ///
    /// Only the last `2 * lookback + 1` candles are examined: first for a break
    /// of the recorded extremes, then for a swing confirmed at the candle
    /// `lookback` positions back.
    pub fn advance(&self, state: &MarketStructureState, recent: &[Candle]) -> StructureUpdate {
        let Some(candle) = recent.last() else {
            return StructureUpdate {
                state: state.clone(),
                event: None,
                new_swings: Vec::new(),
            };
        };

        let mut next = state.clone();
        let event = self.detect_structure_break(state, candle);
        if let Some(ev) = event {
            next.trend = Trend::from(ev.direction);
            next.last_event = Some(ev);
            match ev.direction {
                Direction::Bullish => next.high_broken = true,
                Direction::Bearish => next.low_broken = true,
            }
        }

        let mut new_swings = Vec::new();
        let window = self.window();
        if recent.len() >= window {
            let tail = &recent[recent.len() - window..];
            for swing in detect_swings(tail, self.lookback) {
                let is_newer = |recorded: Option<chrono::DateTime<chrono::Utc>>| {
                    recorded.map_or(true, |t| swing.time > t)
                };
                match swing.kind {
                    SwingKind::High if is_newer(next.swing_high_time) => {
                        next.last_swing_high = Some(swing.price);
                        next.swing_high_time = Some(swing.time);
                        next.high_broken = false;
                    }
                    SwingKind::Low if is_newer(next.swing_low_time) => {
                        next.last_swing_low = Some(swing.price);
                        next.swing_low_time = Some(swing.time);
                        next.low_broken = false;
                    }
                    _ => continue,
                }
                new_swings.push(SwingPoint {
                    index: swing.index + (recent.len() - window),
                    ..swing
                });
            }
        }

        StructureUpdate {
            state: next,
            event,
            new_swings,
        }
    }

    /// Full-history structure pass.
    ///
    /// Replays [`advance`](Self::advance) over every candle. If no break ever
    /// occurred the trend falls back to [`classify_trend`] over all swings.
    pub fn scan_historical(&self, candles: &[Candle]) -> MarketStructureState {
        let window = self.window();
        let mut state = MarketStructureState::empty();
        for end in 0..candles.len() {
            let start = (end + 1).saturating_sub(window);
            state = self.advance(&state, &candles[start..=end]).state;
        }
        if state.last_event.is_none() {
            state.trend = classify_trend(detect_swings(candles, self.lookback));
        }
        state
    }
}
