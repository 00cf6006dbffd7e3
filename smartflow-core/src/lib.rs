//! SmartFlow Core: streaming candle → signal engine built on smart-money concepts.
//!
//! This crate contains the whole analysis pipeline:
//! - Domain types (candles, swings, structure state, zones, signals)
//! - Bounded candle buffers with ordering and duplicate guards
//! - Swing detection, BOS/CHoCH tracking, order block and FVG detection
//! - Liquidity analysis: equal highs/lows, sweeps, displacement
//! - Incremental feature cache with bounded zone storage
//! - Pluggable entry / stop-loss / take-profit / exit determiners
//! - Per-symbol engine with interval lifecycle, kill-zone gating and routing

pub mod analysis;
pub mod buffer;
pub mod cache;
pub mod components;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod synthetic;

pub use config::SmartFlowConfig;
pub use engine::{CandleOutcome, Engine, IntervalState, SignalSink, SymbolEngine};
pub use error::EngineError;
