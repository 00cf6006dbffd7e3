//! Candle: the fundamental market data unit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OHLCV candle for a single symbol on a single interval.
///
/// `open_time` is the candle's open time, not its close time. Only candles with
/// `is_closed = true` are admitted into buffers and caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub interval: Interval,
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

impl Candle {
    /// Full high-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Time at which this candle closes.
    pub fn close_time(&self) -> DateTime<Utc> {
        self.open_time + self.interval.duration()
    }
}

/// Candle interval.
///
/// Serialized in the exchange-style short form (`"15m"`, `"1h"`, `"1d"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

/// Error parsing an interval string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid interval: {0}")]
pub struct ParseIntervalError(pub String);

impl Interval {
    /// Duration in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Interval::M1 => 60,
            Interval::M3 => 180,
            Interval::M5 => 300,
            Interval::M15 => 900,
            Interval::M30 => 1_800,
            Interval::H1 => 3_600,
            Interval::H2 => 7_200,
            Interval::H4 => 14_400,
            Interval::D1 => 86_400,
            Interval::W1 => 604_800,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.seconds())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::D1 => "1d",
            Interval::W1 => "1w",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Interval::M1),
            "3m" => Ok(Interval::M3),
            "5m" => Ok(Interval::M5),
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "1h" | "60m" => Ok(Interval::H1),
            "2h" => Ok(Interval::H2),
            "4h" => Ok(Interval::H4),
            "1d" => Ok(Interval::D1),
            "1w" => Ok(Interval::W1),
            _ => Err(ParseIntervalError(s.to_string())),
        }
    }
}

/// Role an interval plays in multi-timeframe analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalRole {
    /// Lower timeframe: entry timing, sweeps, displacement.
    Ltf,
    /// Middle timeframe: order blocks and fair value gaps.
    Mtf,
    /// Higher timeframe: trend and dealing range.
    Htf,
}

impl IntervalRole {
    /// Default number of buffered candles before an interval of this role goes live.
    pub fn default_min_candles(&self) -> usize {
        match self {
            IntervalRole::Ltf => 50,
            IntervalRole::Mtf => 40,
            IntervalRole::Htf => 30,
        }
    }
}

impl fmt::Display for IntervalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntervalRole::Ltf => "ltf",
            IntervalRole::Mtf => "mtf",
            IntervalRole::Htf => "htf",
        };
        f.write_str(s)
    }
}
