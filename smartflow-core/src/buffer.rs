//! Candle buffer: bounded, time-ordered candle history for one (symbol, interval).
//!
//! Entries are strictly increasing by `open_time`. A candle that does not move
//! time forward is rejected and the buffer is left untouched, so a misbehaving
//! feed cannot corrupt swing or structure detection downstream.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Default number of candles kept per interval.
pub const DEFAULT_BUFFER_CAPACITY: usize = 200;

/// Why a candle was not appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RejectReason {
    /// `open_time` is earlier than the newest buffered candle.
    #[error("candle is older than the newest buffered candle")]
    OutOfOrder,
    /// `open_time` equals the newest buffered candle.
    #[error("candle duplicates the newest buffered candle")]
    Duplicate,
}

/// Fixed-capacity FIFO of closed candles.
#[derive(Debug, Clone)]
pub struct CandleBuffer {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "buffer capacity must be >= 1");
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a candle, evicting the oldest entry when full.
    pub fn append(&mut self, candle: Candle) -> Result<(), RejectReason> {
        if let Some(last) = self.candles.back() {
            if candle.open_time == last.open_time {
                return Err(RejectReason::Duplicate);
            }
            if candle.open_time < last.open_time {
                return Err(RejectReason::OutOfOrder);
            }
        }
        if self.candles.len() == self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
        Ok(())
    }

    /// Read-only view of the buffered candles, oldest first.
    pub fn snapshot(&self) -> &VecDeque<Candle> {
        &self.candles
    }

    /// Contiguous copy of the newest `n` candles, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<Candle> {
        let start = self.candles.len().saturating_sub(n);
        self.candles.range(start..).cloned().collect()
    }

    /// Contiguous copy of every buffered candle, oldest first.
    pub fn to_vec(&self) -> Vec<Candle> {
        self.candles.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }
}

impl Default for CandleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
