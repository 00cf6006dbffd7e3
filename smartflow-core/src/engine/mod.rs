//! Streaming engine: per-symbol candle processing and multi-symbol routing.
//!
//! Each closed candle flows through one [`SymbolEngine`]:
//!
//! 1. Buffer append (open, out-of-order and duplicate candles are dropped)
//! 2. Incremental feature update: zone invalidation, new zones, structure
//! 3. Lifecycle transition (`Backfilled → Live`)
//! 4. Gates: every interval live, entry interval only, kill zone
//! 5. Signal composition: entry → stop-loss → take-profit → validation

pub mod router;
pub mod sink;
pub mod state;
pub mod symbol;

pub use router::Engine;
pub use sink::SignalSink;
pub use state::{CandleOutcome, IntervalState};
pub use symbol::SymbolEngine;
