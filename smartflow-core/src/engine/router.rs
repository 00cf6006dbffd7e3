//! Multi-symbol router.
//!
//! One [`SymbolEngine`] per configured symbol; every symbol is independent,
//! so callers that want parallelism can also drive `SymbolEngine`s directly
//! from separate threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::config::SmartFlowConfig;
use crate::domain::{Candle, Interval};
use crate::error::EngineError;

use super::sink::SignalSink;
use super::state::{CandleOutcome, IntervalState};
use super::symbol::SymbolEngine;

pub struct Engine<S: SignalSink> {
    engines: BTreeMap<String, SymbolEngine>,
    sink: S,
}

impl<S: SignalSink> Engine<S> {
    /// Validate `config` and build one symbol engine per configured symbol.
    pub fn new(config: SmartFlowConfig, sink: S) -> Result<Self, EngineError> {
        config.validate()?;
        let config = Arc::new(config);
        let engines = config
            .symbols
            .iter()
            .map(|symbol| Ok((symbol.clone(), SymbolEngine::new(symbol.clone(), Arc::clone(&config))?)))
            .collect::<Result<BTreeMap<_, _>, EngineError>>()?;
        info!(symbols = engines.len(), intervals = config.intervals.len(), "engine ready");
        Ok(Self { engines, sink })
    }

    fn engine_mut(&mut self, symbol: &str) -> Result<&mut SymbolEngine, EngineError> {
        self.engines
            .get_mut(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    pub fn initialize_with_history(
        &mut self,
        symbol: &str,
        interval: Interval,
        candles: Vec<Candle>,
    ) -> Result<IntervalState, EngineError> {
        self.engine_mut(symbol)?.initialize_with_history(interval, candles)
    }

    pub fn reinitialize(&mut self, symbol: &str, interval: Interval) -> Result<(), EngineError> {
        self.engine_mut(symbol)?.reinitialize(interval)
    }

    /// Route one candle; an emitted signal is also handed to the sink.
    pub fn on_closed_candle(
        &mut self,
        symbol: &str,
        interval: Interval,
        candle: Candle,
    ) -> Result<CandleOutcome, EngineError> {
        let outcome = self.engine_mut(symbol)?.on_closed_candle(interval, candle)?;
        if let Some(signal) = outcome.signal() {
            self.sink.on_signal(signal.clone());
        }
        Ok(outcome)
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolEngine> {
        self.engines.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.engines.keys().map(String::as_str)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
