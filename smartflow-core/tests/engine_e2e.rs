//! End-to-end: backfill an uptrend, break it, watch structure and zones react.
//!
//! Tests:
//! 1. History goes live and classifies a bullish trend
//! 2. One breakdown candle flips the trend through a CHoCH
//! 3. The same candle mitigates an untouched bullish order block below the swing low
//! 4. The router delivers emitted signals to the sink, and only those
//! 5. A continuation candle under weighted gating emits a priced long
//! 6. Under the default conjunctive gating a sweep of equal lows followed by a
//!    bullish displacement emits a long anchored on the fresh order block

use chrono::{DateTime, Duration, TimeZone, Utc};
use smartflow_core::domain::{
    Candle, Direction, Interval, Signal, StructureEventKind, Trend,
};
use smartflow_core::components::{ConditionWeights, GatingPolicy, ScorePolicy};
use smartflow_core::domain::Side;
use smartflow_core::{CandleOutcome, Engine, IntervalState, SmartFlowConfig, SymbolEngine};
use std::sync::Arc;

// ── Helpers ──────────────────────────────────────────────────────────

fn t(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap() + Duration::hours(i)
}

fn candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        symbol: "BTCUSDT".into(),
        interval: Interval::H1,
        open_time: t(i),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
        is_closed: true,
    }
}

/// 50 candles: four cycles of six +1.0 candles and five -0.8 candles, then
/// six more up candles. Every swing high and low is higher than the last.
///
/// Swing lows: 101.7, 103.7, 105.7, 107.7. Swing highs: 106.3 .. 112.3.
/// The bearish candle at each trough is a bullish order block.
fn uptrend() -> Vec<Candle> {
    let mut candles = Vec::new();
    let mut price = 100.0;
    let up = |candles: &mut Vec<Candle>, price: &mut f64| {
        let i = candles.len() as i64;
        candles.push(candle(i, *price, *price + 1.3, *price - 0.1, *price + 1.0));
        *price += 1.0;
    };
    let down = |candles: &mut Vec<Candle>, price: &mut f64| {
        let i = candles.len() as i64;
        candles.push(candle(i, *price, *price + 0.1, *price - 1.1, *price - 0.8));
        *price -= 0.8;
    };
    for _ in 0..4 {
        for _ in 0..6 {
            up(&mut candles, &mut price);
        }
        for _ in 0..5 {
            down(&mut candles, &mut price);
        }
    }
    for _ in 0..6 {
        up(&mut candles, &mut price);
    }
    candles
}

/// Opens at the last close (114.0), wicks to 105.5 and closes at 107.0:
/// below the 107.7 swing low, above the 105.7-106.9 order block.
fn breakdown() -> Candle {
    candle(50, 114.0, 114.1, 105.5, 107.0)
}

fn config() -> Arc<SmartFlowConfig> {
    Arc::new(SmartFlowConfig::single_interval("BTCUSDT", Interval::H1))
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ── 1. Backfill ──────────────────────────────────────────────────────

#[test]
fn history_goes_live_bullish() {
    let mut engine = SymbolEngine::new("BTCUSDT", config()).unwrap();
    let state = engine.initialize_with_history(Interval::H1, uptrend()).unwrap();
    assert_eq!(state, IntervalState::Live);

    let structure = engine.structure(Interval::H1).unwrap();
    assert_eq!(structure.trend, Trend::Bullish);
    assert!(near(structure.last_swing_low.unwrap(), 107.7));
    assert!(near(structure.last_swing_high.unwrap(), 112.3));

    let cache = engine.cache(Interval::H1).unwrap();
    let active_bullish: Vec<_> = cache
        .active_order_blocks()
        .filter(|ob| ob.direction == Direction::Bullish)
        .collect();
    assert_eq!(active_bullish.len(), 4);
    // Every bearish block was later traded through by the next rally.
    assert!(cache
        .active_order_blocks()
        .all(|ob| ob.direction == Direction::Bullish));
}

// ── 2 + 3. Breakdown ────────────────────────────────────────────────

#[test]
fn breakdown_flips_trend_and_mitigates_block() {
    let mut engine = SymbolEngine::new("BTCUSDT", config()).unwrap();
    engine.initialize_with_history(Interval::H1, uptrend()).unwrap();

    let target = engine
        .cache(Interval::H1)
        .unwrap()
        .active_order_blocks()
        .find(|ob| ob.anchor_time == t(32))
        .cloned()
        .unwrap();
    assert_eq!(target.direction, Direction::Bullish);
    assert!(near(target.low, 105.7));
    assert!(near(target.high, 106.9));
    assert!(target.high < breakdown().close);

    let outcome = engine.on_closed_candle(Interval::H1, breakdown()).unwrap();
    // Bearish now, but price sits in discount: no short.
    assert_eq!(outcome, CandleOutcome::NoSignal);

    let structure = engine.structure(Interval::H1).unwrap();
    assert_eq!(structure.trend, Trend::Bearish);
    let event = structure.last_event.unwrap();
    assert_eq!(event.kind, StructureEventKind::Choch);
    assert_eq!(event.direction, Direction::Bearish);
    assert!(near(event.level, 107.7));
    assert_eq!(event.time, t(50));

    let cache = engine.cache(Interval::H1).unwrap();
    let block = cache
        .order_blocks()
        .find(|ob| ob.anchor_time == t(32))
        .unwrap();
    assert!(block.mitigated);
    // The block at the 101.7 trough was not reached.
    assert!(!cache
        .order_blocks()
        .find(|ob| ob.anchor_time == t(10))
        .unwrap()
        .mitigated);
}

#[test]
fn structure_flip_exit_fires_for_longs_only() {
    let mut engine = SymbolEngine::new("BTCUSDT", config()).unwrap();
    engine.initialize_with_history(Interval::H1, uptrend()).unwrap();
    assert!(engine.evaluate_exit(Side::Long).is_none());

    engine.on_closed_candle(Interval::H1, breakdown()).unwrap();
    assert!(engine.evaluate_exit(Side::Long).is_some());
    assert!(engine.evaluate_exit(Side::Short).is_none());
}

#[test]
fn incremental_matches_full_recompute() {
    let mut history = uptrend();
    let mut live = SymbolEngine::new("BTCUSDT", config()).unwrap();
    live.initialize_with_history(Interval::H1, history.clone()).unwrap();
    live.on_closed_candle(Interval::H1, breakdown()).unwrap();

    history.push(breakdown());
    let mut batch = SymbolEngine::new("BTCUSDT", config()).unwrap();
    batch.initialize_with_history(Interval::H1, history).unwrap();

    let live_structure = live.structure(Interval::H1).unwrap();
    let batch_structure = batch.structure(Interval::H1).unwrap();
    assert_eq!(live_structure.trend, batch_structure.trend);
    assert_eq!(live_structure.last_event, batch_structure.last_event);

    let live_obs: Vec<_> = live.cache(Interval::H1).unwrap().order_blocks().cloned().collect();
    let batch_obs: Vec<_> = batch.cache(Interval::H1).unwrap().order_blocks().cloned().collect();
    assert_eq!(live_obs, batch_obs);
}

// ── 4. Router + sink ─────────────────────────────────────────────────

#[test]
fn router_sink_receives_only_emitted_signals() {
    let config = SmartFlowConfig::single_interval("BTCUSDT", Interval::H1);
    let mut engine = Engine::new(config, Vec::<Signal>::new()).unwrap();
    engine
        .initialize_with_history("BTCUSDT", Interval::H1, uptrend())
        .unwrap();

    let outcome = engine
        .on_closed_candle("BTCUSDT", Interval::H1, breakdown())
        .unwrap();
    assert!(outcome.signal().is_none());
    assert!(engine.into_sink().is_empty());
}

// ── 5. Emission ──────────────────────────────────────────────────────

/// Any single optional condition plus the mandatory trend admits an entry.
fn permissive_config() -> SmartFlowConfig {
    let mut config = SmartFlowConfig::single_interval("BTCUSDT", Interval::H1);
    config.gating = GatingPolicy::WeightedScore(ScorePolicy {
        version: 1,
        weights: ConditionWeights::default(),
        threshold: 1.0,
    });
    config
}

/// Continues the rally from 114.0 without breaking new structure.
fn continuation() -> Candle {
    candle(50, 114.0, 115.3, 113.9, 115.0)
}

#[test]
fn continuation_emits_long_anchored_on_nearest_block() {
    let mut engine = Engine::new(permissive_config(), Vec::<Signal>::new()).unwrap();
    engine
        .initialize_with_history("BTCUSDT", Interval::H1, uptrend())
        .unwrap();

    let outcome = engine
        .on_closed_candle("BTCUSDT", Interval::H1, continuation())
        .unwrap();
    let signal = match outcome {
        CandleOutcome::Emitted(signal) => signal,
        other => panic!("expected a signal, got {other:?}"),
    };

    assert_eq!(signal.side(), Side::Long);
    assert_eq!(signal.entry_price(), 115.0);
    // Stop 0.1% under the 107.7 block low, target at 2R.
    let stop = 107.7 * 0.999;
    assert!(near(signal.stop_loss(), stop));
    assert!(near(signal.take_profit(), 115.0 + 2.0 * (115.0 - stop)));
    assert_eq!(signal.timestamp(), t(51));
    assert!(signal
        .strategy_tag()
        .starts_with("smart_money+zone_based+risk_reward@"));

    let delivered = engine.into_sink();
    assert_eq!(delivered, vec![signal]);
}

// ── 6. Conjunctive emission ──────────────────────────────────────────

/// Rally to 110.0, dip to a 106.5 low, rally to a 122.1 top (breaking the
/// 110.3 high), then a straight pullback that prints an equal low at 106.55,
/// drifts sideways and finally wicks through both lows.
fn sweep_setup() -> Vec<Candle> {
    let mut candles = Vec::new();
    let mut price = 100.0;
    let up = |candles: &mut Vec<Candle>, price: &mut f64| {
        let i = candles.len() as i64;
        let p = *price;
        candles.push(candle(i, p, p + 1.0 + 0.3, p - 0.1, p + 1.0));
        *price = p + 1.0;
    };
    let down = |candles: &mut Vec<Candle>, price: &mut f64| {
        let i = candles.len() as i64;
        let p = *price;
        candles.push(candle(i, p, p + 0.1, p - 0.8 - 0.3, p - 0.8));
        *price = p - 0.8;
    };
    for _ in 0..10 {
        up(&mut candles, &mut price);
    }
    for _ in 0..4 {
        down(&mut candles, &mut price);
    }
    for _ in 0..15 {
        up(&mut candles, &mut price);
    }
    for _ in 0..18 {
        down(&mut candles, &mut price);
    }

    let tail = [
        (107.4, 107.5, 106.55, 106.8), // equal low
        (106.8, 107.2, 106.7, 107.1),
        (107.1, 107.5, 107.0, 107.4),
        (107.4, 107.6, 107.1, 107.2),
        (107.2, 107.4, 106.9, 107.0),
        (107.0, 107.3, 106.8, 107.2),
        (107.2, 107.5, 107.0, 107.4),
        (107.4, 107.6, 107.2, 107.3),
        (107.3, 107.4, 106.1, 106.9), // sweep, closes back above the lows
    ];
    for (open, high, low, close) in tail {
        let i = candles.len() as i64;
        candles.push(candle(i, open, high, low, close));
    }
    candles
}

/// Bullish displacement off the sweep that stays in the discount half of
/// the 106.55-122.1 range.
fn displacement() -> Candle {
    candle(56, 106.9, 111.3, 106.8, 111.0)
}

#[test]
fn sweep_and_displacement_emit_under_conjunctive_gating() {
    let mut engine = SymbolEngine::new("BTCUSDT", config()).unwrap();
    let state = engine
        .initialize_with_history(Interval::H1, sweep_setup())
        .unwrap();
    assert_eq!(state, IntervalState::Live);

    let structure = engine.structure(Interval::H1).unwrap();
    assert_eq!(structure.trend, Trend::Bullish);
    assert!(near(structure.last_swing_low.unwrap(), 106.55));
    assert!(near(structure.last_swing_high.unwrap(), 122.1));

    let outcome = engine
        .on_closed_candle(Interval::H1, displacement())
        .unwrap();
    let signal = match outcome {
        CandleOutcome::Emitted(signal) => signal,
        other => panic!("expected a signal, got {other:?}"),
    };

    // The displacement turns the sweep candle into a bullish order block.
    let block = engine
        .cache(Interval::H1)
        .unwrap()
        .active_order_blocks()
        .find(|ob| ob.anchor_time == t(55))
        .cloned()
        .unwrap();
    assert_eq!(block.direction, Direction::Bullish);
    assert!(near(block.low, 106.1));
    assert!(near(block.high, 107.4));

    assert_eq!(signal.side(), Side::Long);
    assert_eq!(signal.entry_price(), 111.0);
    let stop = 106.1 * 0.999;
    assert!(near(signal.stop_loss(), stop));
    assert!(near(signal.take_profit(), 111.0 + 2.0 * (111.0 - stop)));
    assert_eq!(signal.timestamp(), t(57));
}
