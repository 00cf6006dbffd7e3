//! Per-symbol engine: the single writer for every interval of one symbol.
//!
//! Per closed candle: append → cache update → lifecycle transition → all-live
//! gate → (entry interval only) kill-zone gate → compose. Intervals are
//! mapped to roles once at construction; a missing role falls back to the
//! nearest configured one.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::analysis::LiquidityAnalyzer;
use crate::buffer::CandleBuffer;
use crate::cache::FeatureStateCache;
use crate::components::{build_composer, ComposeOutcome, ExitReason, MarketContext, SignalComposer};
use crate::config::{ConfigError, SmartFlowConfig};
use crate::domain::{Candle, Interval, IntervalRole, MarketStructureState, Side, Trend};
use crate::error::{CacheNotInitializedError, EngineError};

use super::state::{CandleOutcome, IntervalState};

const TREND_ROLES: [IntervalRole; 3] = [IntervalRole::Htf, IntervalRole::Mtf, IntervalRole::Ltf];
const ZONE_ROLES: [IntervalRole; 3] = [IntervalRole::Mtf, IntervalRole::Ltf, IntervalRole::Htf];
const ENTRY_ROLES: [IntervalRole; 3] = [IntervalRole::Ltf, IntervalRole::Mtf, IntervalRole::Htf];

/// Buffer, cache and lifecycle of one interval.
#[derive(Debug, Clone)]
struct IntervalUnit {
    role: IntervalRole,
    buffer: CandleBuffer,
    cache: FeatureStateCache,
    state: IntervalState,
    min_candles: usize,
}

impl IntervalUnit {
    /// Promote `Backfilled → Live` once enough candles are buffered.
    fn promote(&mut self, symbol: &str, interval: Interval) {
        if self.state == IntervalState::Backfilled && self.buffer.len() >= self.min_candles {
            self.state = IntervalState::Live;
            info!(
                symbol,
                %interval,
                role = %self.role,
                candles = self.buffer.len(),
                "interval live"
            );
        }
    }
}

/// All intervals of one symbol plus the composer that turns their features
/// into signals.
#[derive(Debug)]
pub struct SymbolEngine {
    symbol: String,
    config: Arc<SmartFlowConfig>,
    units: BTreeMap<Interval, IntervalUnit>,
    composer: SignalComposer,
    liquidity: LiquidityAnalyzer,
    trend_interval: Interval,
    zone_interval: Interval,
    entry_interval: Interval,
}

impl SymbolEngine {
    pub fn new(symbol: impl Into<String>, config: Arc<SmartFlowConfig>) -> Result<Self, EngineError> {
        let symbol = symbol.into();
        config.validate()?;
        if !config.symbols.iter().any(|s| *s == symbol) {
            return Err(EngineError::UnknownSymbol(symbol));
        }

        let composer = build_composer(&config)?.with_fingerprint(&config.fingerprint()?);
        let resolve = |roles: &[IntervalRole]| {
            config.resolve_role(roles).ok_or(ConfigError::NoIntervals)
        };
        let trend_interval = resolve(&TREND_ROLES)?;
        let zone_interval = resolve(&ZONE_ROLES)?;
        let entry_interval = resolve(&ENTRY_ROLES)?;

        let units = config
            .intervals
            .iter()
            .map(|ic| {
                let unit = IntervalUnit {
                    role: ic.role,
                    buffer: CandleBuffer::new(ic.buffer_capacity),
                    cache: config.feature_cache(),
                    state: IntervalState::Uninitialized,
                    min_candles: ic.min_candles(),
                };
                (ic.interval, unit)
            })
            .collect();

        debug!(
            %symbol,
            %trend_interval,
            %zone_interval,
            %entry_interval,
            strategy = composer.strategy_tag(),
            "symbol engine created"
        );

        Ok(Self {
            symbol,
            liquidity: config.detection.liquidity_analyzer(),
            config,
            units,
            composer,
            trend_interval,
            zone_interval,
            entry_interval,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &SmartFlowConfig {
        &self.config
    }

    pub fn strategy_tag(&self) -> &str {
        self.composer.strategy_tag()
    }

    /// Intervals supplying trend, zones and entry timing, in that order.
    pub fn role_intervals(&self) -> (Interval, Interval, Interval) {
        (self.trend_interval, self.zone_interval, self.entry_interval)
    }

    fn unit(&self, interval: Interval) -> Result<&IntervalUnit, EngineError> {
        self.units.get(&interval).ok_or_else(|| EngineError::UnknownInterval {
            symbol: self.symbol.clone(),
            interval,
        })
    }

    fn unit_mut(&mut self, interval: Interval) -> Result<&mut IntervalUnit, EngineError> {
        let symbol = &self.symbol;
        self.units.get_mut(&interval).ok_or_else(|| EngineError::UnknownInterval {
            symbol: symbol.clone(),
            interval,
        })
    }

    /// Load history, pre-compute features, move to `Backfilled` (or straight
    /// to `Live` when the history already covers the warmup).
    ///
    /// Open, out-of-order and duplicate candles in `candles` are skipped.
    pub fn initialize_with_history(
        &mut self,
        interval: Interval,
        candles: Vec<Candle>,
    ) -> Result<IntervalState, EngineError> {
        let symbol = self.symbol.clone();
        let unit = self.unit_mut(interval)?;
        if unit.state != IntervalState::Uninitialized {
            return Err(EngineError::AlreadyInitialized { symbol, interval });
        }

        let total = candles.len();
        let mut skipped = 0usize;
        for candle in candles {
            if !candle.is_closed || candle.symbol != symbol || candle.interval != interval {
                skipped += 1;
                continue;
            }
            if let Err(reason) = unit.buffer.append(candle) {
                debug!(%symbol, %interval, %reason, "history candle rejected");
                skipped += 1;
            }
        }

        let history = unit.buffer.to_vec();
        unit.cache.pre_compute(&history);
        unit.state = IntervalState::Backfilled;
        info!(
            %symbol,
            %interval,
            loaded = total - skipped,
            skipped,
            "interval backfilled"
        );
        unit.promote(&symbol, interval);
        Ok(unit.state)
    }

    /// Drop buffer and cache of `interval` and return it to `Uninitialized`.
    pub fn reinitialize(&mut self, interval: Interval) -> Result<(), EngineError> {
        let symbol = self.symbol.clone();
        let unit = self.unit_mut(interval)?;
        unit.buffer.clear();
        unit.cache.reset();
        unit.state = IntervalState::Uninitialized;
        info!(%symbol, %interval, "interval reinitialized");
        Ok(())
    }

    /// Process one candle of `interval`.
    pub fn on_closed_candle(
        &mut self,
        interval: Interval,
        candle: Candle,
    ) -> Result<CandleOutcome, EngineError> {
        if candle.symbol != self.symbol {
            return Err(EngineError::SymbolMismatch {
                expected: self.symbol.clone(),
                got: candle.symbol,
            });
        }
        if candle.interval != interval {
            return Err(EngineError::IntervalMismatch {
                expected: interval,
                got: candle.interval,
            });
        }

        let symbol = self.symbol.clone();
        let unit = self.unit_mut(interval)?;
        if !candle.is_closed {
            return Ok(CandleOutcome::Ignored);
        }
        if unit.state == IntervalState::Uninitialized {
            return Err(EngineError::CacheNotInitialized {
                symbol,
                interval,
                source: CacheNotInitializedError,
            });
        }

        let close_time = candle.close_time();
        let price = candle.close;
        if let Err(reason) = unit.buffer.append(candle) {
            debug!(%symbol, %interval, %reason, "candle rejected");
            return Ok(CandleOutcome::Rejected(reason));
        }

        let recent = unit.buffer.last_n(unit.cache.recent_window());
        let report = unit
            .cache
            .update(&recent)
            .map_err(|source| EngineError::CacheNotInitialized {
                symbol: symbol.clone(),
                interval,
                source,
            })?;
        if let Some(event) = report.structure_event {
            info!(
                %symbol,
                %interval,
                kind = ?event.kind,
                direction = ?event.direction,
                level = event.level,
                "structure break"
            );
        }
        if report.mitigated + report.filled + report.new_order_blocks + report.new_fvgs > 0 {
            debug!(%symbol, %interval, ?report, "zones changed");
        }
        unit.promote(&symbol, interval);

        if !self.is_live() {
            return Ok(CandleOutcome::Warming);
        }
        if interval != self.entry_interval {
            return Ok(CandleOutcome::Updated);
        }
        if !self.config.in_kill_zone(close_time.time()) {
            return Ok(CandleOutcome::OutsideKillZone);
        }

        let ctx = self.market_context(close_time, price)?;
        Ok(match self.composer.compose(&ctx) {
            ComposeOutcome::NoEntry => CandleOutcome::NoSignal,
            ComposeOutcome::Emitted(signal) => {
                info!(
                    symbol = signal.symbol(),
                    side = %signal.side(),
                    entry = signal.entry_price(),
                    stop_loss = signal.stop_loss(),
                    take_profit = signal.take_profit(),
                    "signal emitted"
                );
                CandleOutcome::Emitted(signal)
            }
            ComposeOutcome::Discarded(err) => {
                warn!(%symbol, %interval, error = %err, "signal discarded");
                CandleOutcome::SignalDiscarded(err)
            }
        })
    }

    /// Assemble the feature snapshot the entry determiner reads.
    pub fn market_context(
        &self,
        timestamp: DateTime<Utc>,
        price: f64,
    ) -> Result<MarketContext, EngineError> {
        let trend_unit = self.unit(self.trend_interval)?;
        let zone_unit = self.unit(self.zone_interval)?;
        let entry_unit = self.unit(self.entry_interval)?;

        let structure = trend_unit.cache.structure();
        let liquidity = self
            .liquidity
            .analyze(&entry_unit.buffer.last_n(self.config.detection.liquidity_window));

        Ok(MarketContext {
            symbol: self.symbol.clone(),
            timestamp,
            price,
            trend: structure.map_or(Trend::Sideways, |s| s.trend),
            range: structure.and_then(MarketStructureState::range),
            order_blocks: zone_unit.cache.active_order_blocks().cloned().collect(),
            fvgs: zone_unit.cache.active_fvgs().cloned().collect(),
            sweep: liquidity.sweep,
            displacement: liquidity.displacement,
        })
    }

    /// True once every configured interval is `Live`.
    pub fn is_live(&self) -> bool {
        self.units.values().all(|u| u.state == IntervalState::Live)
    }

    pub fn state(&self, interval: Interval) -> Option<IntervalState> {
        self.units.get(&interval).map(|u| u.state)
    }

    pub fn structure(&self, interval: Interval) -> Option<&MarketStructureState> {
        self.units.get(&interval).and_then(|u| u.cache.structure())
    }

    pub fn cache(&self, interval: Interval) -> Option<&FeatureStateCache> {
        self.units.get(&interval).map(|u| &u.cache)
    }

    pub fn buffer(&self, interval: Interval) -> Option<&CandleBuffer> {
        self.units.get(&interval).map(|u| &u.buffer)
    }

    /// Ask the exit determiner whether the trend interval's structure
    /// invalidates a position on `side`.
    pub fn evaluate_exit(&self, side: Side) -> Option<ExitReason> {
        let structure = self.structure(self.trend_interval)?;
        self.composer.evaluate_exit(side, structure)
    }
}
