//! Per-interval lifecycle and per-candle outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::buffer::RejectReason;
use crate::domain::{InvalidSignalError, Signal};

/// Lifecycle of one (symbol, interval).
///
/// `Uninitialized → Backfilled` when history is loaded and pre-computed,
/// `Backfilled → Live` once the buffer holds the role's minimum candle count.
/// `Live` is terminal until an explicit reinitialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalState {
    Uninitialized,
    Backfilled,
    Live,
}

impl fmt::Display for IntervalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntervalState::Uninitialized => "uninitialized",
            IntervalState::Backfilled => "backfilled",
            IntervalState::Live => "live",
        };
        f.write_str(s)
    }
}

/// What happened to one closed candle.
#[derive(Debug, Clone, PartialEq)]
pub enum CandleOutcome {
    /// The candle was not closed; nothing changed.
    Ignored,
    /// The buffer refused the candle; nothing changed.
    Rejected(RejectReason),
    /// Features updated; some interval of the symbol is not live yet.
    Warming,
    /// Features updated; the candle is not on the entry interval, so no evaluation ran.
    Updated,
    /// Features updated; the candle closed outside every kill zone.
    OutsideKillZone,
    /// Evaluation ran and the entry determiner declined.
    NoSignal,
    Emitted(Signal),
    /// Evaluation produced prices that violate the side ordering.
    SignalDiscarded(InvalidSignalError),
}

impl CandleOutcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            CandleOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }
}
