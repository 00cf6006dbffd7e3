//! Market structure values: swings, trend, structure breaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::zone::Direction;

/// Prevailing trend of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
}

impl Trend {
    /// Direction of a trending market, `None` when sideways.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Trend::Bullish => Some(Direction::Bullish),
            Trend::Bearish => Some(Direction::Bearish),
            Trend::Sideways => None,
        }
    }
}

impl From<Direction> for Trend {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => Trend::Bullish,
            Direction::Bearish => Trend::Bearish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// Position in the candle slice the swing was detected in.
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureEventKind {
    /// Break of structure: continuation in the prevailing direction.
    Bos,
    /// Change of character: break against the prevailing direction.
    Choch,
}

/// A close beyond a recorded swing extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureEvent {
    pub kind: StructureEventKind,
    /// Direction of the break (bullish = broke a swing high).
    pub direction: Direction,
    /// The swing level that was broken.
    pub level: f64,
    /// Open time of the candle that closed beyond the level.
    pub time: DateTime<Utc>,
}

impl StructureEvent {
    pub fn is_choch(&self) -> bool {
        self.kind == StructureEventKind::Choch
    }
}

/// Live market structure of one (symbol, interval).
///
/// Replaced wholesale on every structure change, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStructureState {
    pub trend: Trend,
    pub last_swing_high: Option<f64>,
    pub last_swing_low: Option<f64>,
    pub swing_high_time: Option<DateTime<Utc>>,
    pub swing_low_time: Option<DateTime<Utc>>,
    pub last_event: Option<StructureEvent>,
    /// The recorded swing high has already been closed through.
    pub high_broken: bool,
    /// The recorded swing low has already been closed through.
    pub low_broken: bool,
}

impl MarketStructureState {
    /// State before any swing is known.
    pub fn empty() -> Self {
        Self {
            trend: Trend::Sideways,
            last_swing_high: None,
            last_swing_low: None,
            swing_high_time: None,
            swing_low_time: None,
            last_event: None,
            high_broken: false,
            low_broken: false,
        }
    }

    /// Dealing range between the recorded swing low and swing high.
    pub fn range(&self) -> Option<(f64, f64)> {
        match (self.last_swing_low, self.last_swing_high) {
            (Some(low), Some(high)) if high > low => Some((low, high)),
            _ => None,
        }
    }
}

impl Default for MarketStructureState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_direction() {
        assert_eq!(Trend::Bullish.direction(), Some(Direction::Bullish));
        assert_eq!(Trend::Sideways.direction(), None);
        assert_eq!(Trend::from(Direction::Bearish), Trend::Bearish);
    }

    #[test]
    fn range_requires_both_swings() {
        let mut state = MarketStructureState::empty();
        assert_eq!(state.range(), None);
        state.last_swing_low = Some(90.0);
        assert_eq!(state.range(), None);
        state.last_swing_high = Some(110.0);
        assert_eq!(state.range(), Some((90.0, 110.0)));
    }

    #[test]
    fn inverted_range_is_none() {
        let mut state = MarketStructureState::empty();
        state.last_swing_low = Some(110.0);
        state.last_swing_high = Some(100.0);
        assert_eq!(state.range(), None);
    }
}
