//! Trading signals and the values handed between signal components.
//!
//! `EntryDecision` → `PriceContext` → `Signal`. A `Signal` can only be built
//! through [`Signal::new`], which enforces the price ordering invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::zone::Direction;

/// Trade side of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Market direction a position on this side profits from.
    pub fn direction(self) -> Direction {
        match self {
            Side::Long => Direction::Bullish,
            Side::Short => Direction::Bearish,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("LONG"),
            Side::Short => f.write_str("SHORT"),
        }
    }
}

/// Typed price context attached to an entry decision.
///
/// Closed set: stop-loss and take-profit determiners match on variants
/// instead of looking up string keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceExtra {
    /// Bounds of the zone that justified the entry.
    ZoneBounds { low: f64, high: f64 },
    /// Range of the displacement candle.
    DisplacementSize { size: f64 },
    /// Extreme of the wick that swept liquidity.
    SweepLevel { level: f64 },
}

/// Output of an entry determiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDecision {
    pub side: Side,
    pub entry_price: f64,
    pub extras: Vec<PriceExtra>,
}

/// Immutable pricing context passed to stop-loss and take-profit determiners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceContext {
    pub entry_price: f64,
    pub side: Side,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub extras: Vec<PriceExtra>,
}

impl PriceContext {
    pub fn from_decision(
        decision: &EntryDecision,
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_price: decision.entry_price,
            side: decision.side,
            symbol: symbol.into(),
            timestamp,
            extras: decision.extras.clone(),
        }
    }

    /// First zone bounds carried by the context, if any.
    pub fn zone_bounds(&self) -> Option<(f64, f64)> {
        self.extras.iter().find_map(|extra| match extra {
            PriceExtra::ZoneBounds { low, high } => Some((*low, *high)),
            _ => None,
        })
    }

    pub fn displacement_size(&self) -> Option<f64> {
        self.extras.iter().find_map(|extra| match extra {
            PriceExtra::DisplacementSize { size } => Some(*size),
            _ => None,
        })
    }

    pub fn sweep_level(&self) -> Option<f64> {
        self.extras.iter().find_map(|extra| match extra {
            PriceExtra::SweepLevel { level } => Some(*level),
            _ => None,
        })
    }
}

/// A signal whose prices violate the side ordering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "invalid {side} signal for {symbol}: stop_loss={stop_loss}, entry={entry_price}, take_profit={take_profit}"
)]
pub struct InvalidSignalError {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Terminal artifact of the engine.
///
/// Invariant: LONG has `stop_loss < entry_price < take_profit`,
/// SHORT has `take_profit < entry_price < stop_loss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignalRecord")]
pub struct Signal {
    symbol: String,
    side: Side,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
    timestamp: DateTime<Utc>,
    strategy_tag: String,
}

impl Signal {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
        timestamp: DateTime<Utc>,
        strategy_tag: impl Into<String>,
    ) -> Result<Self, InvalidSignalError> {
        let symbol = symbol.into();
        let finite = entry_price.is_finite() && stop_loss.is_finite() && take_profit.is_finite();
        let ordered = match side {
            Side::Long => stop_loss < entry_price && entry_price < take_profit,
            Side::Short => take_profit < entry_price && entry_price < stop_loss,
        };
        if !finite || !ordered || stop_loss <= 0.0 || take_profit <= 0.0 {
            return Err(InvalidSignalError {
                symbol,
                side,
                entry_price,
                stop_loss,
                take_profit,
            });
        }
        Ok(Self {
            symbol,
            side,
            entry_price,
            stop_loss,
            take_profit,
            timestamp,
            strategy_tag: strategy_tag.into(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn stop_loss(&self) -> f64 {
        self.stop_loss
    }

    pub fn take_profit(&self) -> f64 {
        self.take_profit
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn strategy_tag(&self) -> &str {
        &self.strategy_tag
    }

    /// Reward divided by risk.
    pub fn risk_reward(&self) -> f64 {
        let risk = (self.entry_price - self.stop_loss).abs();
        let reward = (self.take_profit - self.entry_price).abs();
        reward / risk
    }
}

/// Wire form of a signal; deserialization re-validates through [`Signal::new`].
#[derive(Deserialize)]
struct SignalRecord {
    symbol: String,
    side: Side,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
    timestamp: DateTime<Utc>,
    strategy_tag: String,
}

impl TryFrom<SignalRecord> for Signal {
    type Error = InvalidSignalError;

    fn try_from(record: SignalRecord) -> Result<Self, Self::Error> {
        Signal::new(
            record.symbol,
            record.side,
            record.entry_price,
            record.stop_loss,
            record.take_profit,
            record.timestamp,
            record.strategy_tag,
        )
    }
}
