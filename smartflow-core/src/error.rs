//! Error types shared across the engine.

use thiserror::Error;

use crate::components::FactoryError;
use crate::config::ConfigError;
use crate::domain::Interval;

/// [`FeatureStateCache::update`](crate::cache::FeatureStateCache::update) was
/// called before `pre_compute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("feature cache updated before pre_compute")]
pub struct CacheNotInitializedError;

/// Sequencing and routing errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("symbol {0} is not configured")]
    UnknownSymbol(String),

    #[error("interval {interval} is not configured for {symbol}")]
    UnknownInterval { symbol: String, interval: Interval },

    #[error("candle for {got} routed to the {expected} engine")]
    SymbolMismatch { expected: String, got: String },

    #[error("candle tagged {got} routed to the {expected} interval")]
    IntervalMismatch { expected: Interval, got: Interval },

    #[error("{symbol} {interval} is already initialized; call reinitialize first")]
    AlreadyInitialized { symbol: String, interval: Interval },

    #[error("{symbol} {interval}: {source}")]
    CacheNotInitialized {
        symbol: String,
        interval: Interval,
        source: CacheNotInitializedError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Factory(#[from] FactoryError),
}
