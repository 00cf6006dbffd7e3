//! Domain types for SmartFlow

pub mod candle;
pub mod signal;
pub mod structure;
pub mod zone;

pub use candle::{Candle, Interval, IntervalRole, ParseIntervalError};
pub use signal::{EntryDecision, InvalidSignalError, PriceContext, PriceExtra, Side, Signal};
pub use structure::{
    MarketStructureState, StructureEvent, StructureEventKind, SwingKind, SwingPoint, Trend,
};
pub use zone::{Direction, FairValueGap, OrderBlock};

/// Symbol type alias
pub type Symbol = String;
