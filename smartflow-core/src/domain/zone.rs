//! Price zones: order blocks and fair value gaps.
//!
//! Zones are created by the zone detector and owned by the feature cache.
//! Their invalidation flags (`mitigated`, `filled`) only ever move from
//! false to true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::signal::Side;

/// Directional bias of a zone, swing break or sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
        }
    }

    /// Trade side that follows this direction.
    pub fn side(self) -> Side {
        match self {
            Direction::Bullish => Side::Long,
            Direction::Bearish => Side::Short,
        }
    }
}

/// Last opposite-colored candle before a displacement move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    /// Open time of the order block candle.
    pub anchor_time: DateTime<Utc>,
    /// Open time of the candle that completed the displacement move.
    pub formed_at: DateTime<Utc>,
    pub low: f64,
    pub high: f64,
    pub direction: Direction,
    /// Move range divided by the average range before the move.
    pub displacement_ratio: f64,
    pub mitigated: bool,
}

impl OrderBlock {
    /// Returns true if `candle` crosses the block against its direction.
    ///
    /// Bullish blocks are mitigated when price trades below `low`, bearish
    /// blocks when price trades above `high`.
    pub fn is_crossed_by(&self, candle: &Candle) -> bool {
        match self.direction {
            Direction::Bullish => candle.low < self.low,
            Direction::Bearish => candle.high > self.high,
        }
    }

    /// Marks the block mitigated if `candle` crosses it. Returns true on transition.
    pub fn mitigate_with(&mut self, candle: &Candle) -> bool {
        if self.mitigated || candle.open_time <= self.formed_at {
            return false;
        }
        if self.is_crossed_by(candle) {
            self.mitigated = true;
            return true;
        }
        false
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// Three-candle imbalance left unfilled by the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    /// Open time of the middle (impulse) candle.
    pub anchor_time: DateTime<Utc>,
    /// Open time of the third candle, which confirms the gap.
    pub formed_at: DateTime<Utc>,
    pub gap_low: f64,
    pub gap_high: f64,
    pub direction: Direction,
    pub filled: bool,
}

impl FairValueGap {
    pub fn size(&self) -> f64 {
        self.gap_high - self.gap_low
    }

    /// Returns true if `candle` trades into `[gap_low, gap_high]`.
    ///
    /// Price approaches a bullish gap from above and a bearish gap from below.
    pub fn is_entered_by(&self, candle: &Candle) -> bool {
        match self.direction {
            Direction::Bullish => candle.low <= self.gap_high,
            Direction::Bearish => candle.high >= self.gap_low,
        }
    }

    /// Marks the gap filled if `candle` enters it. Returns true on transition.
    pub fn fill_with(&mut self, candle: &Candle) -> bool {
        if self.filled || candle.open_time <= self.formed_at {
            return false;
        }
        if self.is_entered_by(candle) {
            self.filled = true;
            return true;
        }
        false
    }
}
