//! Candle range statistics shared by the detectors.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first candle of a slice has no previous close and uses high-low.

use crate::domain::Candle;

/// Compute the True Range series of a candle slice.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        let hl = candle.high - candle.low;
        if i == 0 {
            tr.push(hl);
            continue;
        }
        let pc = candles[i - 1].close;
        tr.push(hl.max((candle.high - pc).abs()).max((candle.low - pc).abs()));
    }
    tr
}

/// Mean high-low range. `None` for an empty slice or when any value is NaN.
pub fn average_range(candles: &[Candle]) -> Option<f64> {
    mean(candles.iter().map(Candle::range))
}

/// Mean True Range over the slice.
pub fn average_true_range(candles: &[Candle]) -> Option<f64> {
    mean(true_range(candles).into_iter())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        if v.is_nan() {
            return None;
        }
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
