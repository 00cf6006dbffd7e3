//! Per-interval feature cache.
//!
//! `pre_compute` runs once over the backfilled buffer. After that every closed
//! candle goes through `update`, which touches only the cached zones and the
//! newest [`recent_window`](FeatureStateCache::recent_window) candles:
//!
//! 1. invalidate: mitigate order blocks / fill gaps crossed by the new candle
//! 2. detect: zones completed by the new candle, deduplicated, FIFO-evicted
//! 3. structure: one incremental tracker step

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{MarketStructureTracker, ZoneDetector};
use crate::domain::{Candle, FairValueGap, MarketStructureState, OrderBlock, StructureEvent};
use crate::error::CacheNotInitializedError;

use super::bounded::BoundedFifo;

/// What a single [`FeatureStateCache::update`] changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub mitigated: usize,
    pub filled: usize,
    pub new_order_blocks: usize,
    pub new_fvgs: usize,
    pub evicted_order_blocks: usize,
    pub evicted_fvgs: usize,
    pub structure_event: Option<StructureEvent>,
    pub new_swings: usize,
}

/// Live zones and market structure of one (symbol, interval).
#[derive(Debug, Clone)]
pub struct FeatureStateCache {
    detector: ZoneDetector,
    tracker: MarketStructureTracker,
    order_blocks: BoundedFifo<OrderBlock>,
    fvgs: BoundedFifo<FairValueGap>,
    structure: Option<MarketStructureState>,
}

impl FeatureStateCache {
    pub fn new(
        detector: ZoneDetector,
        tracker: MarketStructureTracker,
        max_order_blocks: usize,
        max_fvgs: usize,
    ) -> Self {
        Self {
            detector,
            tracker,
            order_blocks: BoundedFifo::new(max_order_blocks),
            fvgs: BoundedFifo::new(max_fvgs),
            structure: None,
        }
    }

    /// Number of newest candles `update` expects.
    pub fn recent_window(&self) -> usize {
        self.detector.window().max(self.tracker.window())
    }

    pub fn is_initialized(&self) -> bool {
        self.structure.is_some()
    }

    /// Full-buffer pass: historical zones, their invalidation by every later
    /// candle in the buffer, and the structure state.
    pub fn pre_compute(&mut self, candles: &[Candle]) {
        self.order_blocks.clear();
        self.fvgs.clear();

        let (order_blocks, fvgs) = self.detector.scan_historical(candles);
        for mut ob in order_blocks {
            let formed_at = ob.formed_at;
            for candle in candles.iter().filter(|c| c.open_time > formed_at) {
                if ob.mitigate_with(candle) {
                    break;
                }
            }
            self.order_blocks.push(ob);
        }
        for mut fvg in fvgs {
            let formed_at = fvg.formed_at;
            for candle in candles.iter().filter(|c| c.open_time > formed_at) {
                if fvg.fill_with(candle) {
                    break;
                }
            }
            self.fvgs.push(fvg);
        }

        let state = self.tracker.scan_historical(candles);
        debug!(
            candles = candles.len(),
            order_blocks = self.order_blocks.len(),
            fvgs = self.fvgs.len(),
            trend = ?state.trend,
            "feature cache pre-computed"
        );
        self.structure = Some(state);
    }

    /// Incremental step for the newest candle of `recent` (oldest first).
    pub fn update(&mut self, recent: &[Candle]) -> Result<UpdateReport, CacheNotInitializedError> {
        let Some(state) = self.structure.as_ref() else {
            return Err(CacheNotInitializedError);
        };
        let mut report = UpdateReport::default();
        let Some(candle) = recent.last() else {
            return Ok(report);
        };

        for ob in self.order_blocks.iter_mut() {
            if ob.mitigate_with(candle) {
                report.mitigated += 1;
            }
        }
        for fvg in self.fvgs.iter_mut() {
            if fvg.fill_with(candle) {
                report.filled += 1;
            }
        }

        let scan = self.detector.scan_recent(recent);
        for ob in scan.order_blocks {
            let known = self
                .order_blocks
                .iter()
                .any(|o| o.anchor_time == ob.anchor_time && o.direction == ob.direction);
            if known {
                continue;
            }
            report.new_order_blocks += 1;
            if self.order_blocks.push(ob).is_some() {
                report.evicted_order_blocks += 1;
            }
        }
        for fvg in scan.fvgs {
            let known = self
                .fvgs
                .iter()
                .any(|g| g.anchor_time == fvg.anchor_time && g.direction == fvg.direction);
            if known {
                continue;
            }
            report.new_fvgs += 1;
            if self.fvgs.push(fvg).is_some() {
                report.evicted_fvgs += 1;
            }
        }

        let step = self.tracker.advance(state, recent);
        report.structure_event = step.event;
        report.new_swings = step.new_swings.len();
        if step.changed() {
            self.structure = Some(step.state);
        }

        Ok(report)
    }

    pub fn active_order_blocks(&self) -> impl Iterator<Item = &OrderBlock> + '_ {
        self.order_blocks.iter().filter(|ob| !ob.mitigated)
    }

    pub fn active_fvgs(&self) -> impl Iterator<Item = &FairValueGap> + '_ {
        self.fvgs.iter().filter(|fvg| !fvg.filled)
    }

    /// Every cached block, mitigated or not, oldest first.
    pub fn order_blocks(&self) -> impl Iterator<Item = &OrderBlock> + '_ {
        self.order_blocks.iter()
    }

    pub fn fvgs(&self) -> impl Iterator<Item = &FairValueGap> + '_ {
        self.fvgs.iter()
    }

    /// Insert a zone directly, bypassing detection. FIFO eviction still applies.
    pub fn push_order_block(&mut self, ob: OrderBlock) -> Option<OrderBlock> {
        self.order_blocks.push(ob)
    }

    pub fn push_fvg(&mut self, fvg: FairValueGap) -> Option<FairValueGap> {
        self.fvgs.push(fvg)
    }

    pub fn structure(&self) -> Option<&MarketStructureState> {
        self.structure.as_ref()
    }

    /// Drop every zone and the structure slot.
    pub fn reset(&mut self) {
        self.order_blocks.clear();
        self.fvgs.clear();
        self.structure = None;
    }
}
