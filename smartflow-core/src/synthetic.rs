//! Deterministic synthetic candle feeds.
//!
//! A master seed is expanded into per-(symbol, interval) sub-seeds with
//! BLAKE3, so a feed depends only on its own key and never on the order in
//! which feeds are generated or on thread scheduling.
//!
//! Prices follow a regime-switching random walk: trend legs alternate with
//! pullbacks and the occasional wide-range candle, which is enough to
//! exercise swings, structure breaks, zones and sweeps.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Candle, Interval};

#[derive(Debug, Clone)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Order-independent sub-seed for one feed.
    pub fn sub_seed(&self, symbol: &str, interval: Interval) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(interval.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, symbol: &str, interval: Interval) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(symbol, interval))
    }
}

/// Shape of a synthetic feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedParams {
    pub start_price: f64,
    /// Typical candle range as a fraction of price.
    pub volatility: f64,
    /// Per-candle drift during a trend leg, as a fraction of price.
    pub drift: f64,
    /// Trend legs last between 1 and this many candles.
    pub max_leg: usize,
    /// Probability that a candle is a wide-range (displacement) candle.
    pub shock_probability: f64,
}

impl Default for FeedParams {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            volatility: 0.004,
            drift: 0.0015,
            max_leg: 12,
            shock_probability: 0.05,
        }
    }
}

/// Generate `count` closed candles starting at `start`.
///
/// # Panics
/// If `params.start_price` or `params.volatility` is not positive, or
/// `params.max_leg` is zero.
pub fn generate_candles(
    seeds: &SeedHierarchy,
    symbol: &str,
    interval: Interval,
    start: DateTime<Utc>,
    count: usize,
    params: FeedParams,
) -> Vec<Candle> {
    assert!(params.start_price > 0.0, "start_price must be positive");
    assert!(params.volatility > 0.0, "volatility must be positive");
    assert!(params.max_leg >= 1, "max_leg must be >= 1");

    let mut rng = seeds.rng_for(symbol, interval);
    let mut candles = Vec::with_capacity(count);
    let mut price = params.start_price;
    let mut open_time = start;
    let mut bias = 1.0;
    let mut leg_left = 0usize;

    for _ in 0..count {
        if leg_left == 0 {
            // Long legs continue the trend; short ones pull back against it.
            leg_left = rng.gen_range(1..=params.max_leg);
            if leg_left <= params.max_leg / 3 || rng.gen_bool(0.15) {
                bias = -bias;
            }
        }
        leg_left -= 1;

        let shock = rng.gen_bool(params.shock_probability.clamp(0.0, 1.0));
        let scale = if shock { 4.0 } else { 1.0 };
        let noise: f64 = rng.gen_range(-1.0..1.0);
        let change = price * (bias * params.drift * scale + noise * params.volatility * 0.5);

        let open = price;
        let close = (open + change).max(open * 0.5);
        let wick_up = price * params.volatility * rng.gen_range(0.0..0.6);
        let wick_down = price * params.volatility * rng.gen_range(0.0..0.6);
        let high = open.max(close) + wick_up;
        let low = (open.min(close) - wick_down).max(f64::MIN_POSITIVE);

        candles.push(Candle {
            symbol: symbol.to_string(),
            interval,
            open_time,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(100.0..1_000.0) * scale,
            is_closed: true,
        });

        price = close;
        open_time += interval.duration();
    }

    candles
}
