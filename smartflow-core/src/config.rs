//! Engine configuration: detection thresholds, cache sizes, interval roles,
//! kill zones, gating policy and component selection.
//!
//! Loaded once from TOML, validated, then shared read-only behind an `Arc`
//! by every per-symbol engine.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::analysis::{LiquidityAnalyzer, MarketStructureTracker, ZoneDetector};
use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::cache::{FeatureStateCache, DEFAULT_MAX_FVGS, DEFAULT_MAX_ORDER_BLOCKS};
use crate::components::{build_composer, FactoryError, GatingPolicy};
use crate::domain::{Interval, IntervalRole};

/// Configuration of a single component (entry, stop-loss, take-profit or exit).
///
/// Uses `BTreeMap` for deterministic key ordering during serialization → hashing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentConfig {
    pub component_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ComponentConfig {
    pub fn new(component_type: impl Into<String>, params: &[(&str, f64)]) -> Self {
        Self {
            component_type: component_type.into(),
            params: params.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

/// Pattern detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    pub swing_lookback: usize,
    pub displacement_ratio_threshold: f64,
    pub displacement_atr_multiplier: f64,
    /// Minimum FVG size as a percentage of the middle candle's close.
    pub fvg_min_gap_pct: f64,
    pub ob_min_strength: f64,
    pub max_move_candles: usize,
    pub average_range_window: usize,
    pub liquidity_tolerance_pct: f64,
    pub liquidity_swing_lookback: usize,
    pub structure_break_buffer_pct: f64,
    pub sweep_window: usize,
    pub liquidity_window: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            swing_lookback: 5,
            displacement_ratio_threshold: 2.0,
            displacement_atr_multiplier: 1.5,
            fvg_min_gap_pct: 0.05,
            ob_min_strength: 0.5,
            max_move_candles: 3,
            average_range_window: 10,
            liquidity_tolerance_pct: 0.1,
            liquidity_swing_lookback: 2,
            structure_break_buffer_pct: 0.0,
            sweep_window: 5,
            liquidity_window: 50,
        }
    }
}

impl DetectionConfig {
    pub fn zone_detector(&self) -> ZoneDetector {
        ZoneDetector::new(
            self.fvg_min_gap_pct,
            self.displacement_ratio_threshold,
            self.ob_min_strength,
            self.max_move_candles,
            self.average_range_window,
        )
    }

    pub fn structure_tracker(&self) -> MarketStructureTracker {
        MarketStructureTracker::new(self.swing_lookback, self.structure_break_buffer_pct)
    }

    pub fn liquidity_analyzer(&self) -> LiquidityAnalyzer {
        LiquidityAnalyzer::new(
            self.liquidity_tolerance_pct,
            self.liquidity_swing_lookback,
            self.sweep_window,
            self.displacement_atr_multiplier,
            self.liquidity_window,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("swing_lookback", self.swing_lookback),
            ("max_move_candles", self.max_move_candles),
            ("average_range_window", self.average_range_window),
            ("liquidity_swing_lookback", self.liquidity_swing_lookback),
            ("sweep_window", self.sweep_window),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be >= 1"));
            }
        }
        if self.liquidity_window <= self.sweep_window {
            return Err(ConfigError::invalid(
                "liquidity_window",
                "must be larger than sweep_window",
            ));
        }

        let positive = [
            ("displacement_ratio_threshold", self.displacement_ratio_threshold),
            ("displacement_atr_multiplier", self.displacement_atr_multiplier),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, "must be a positive number"));
            }
        }
        let non_negative = [
            ("fvg_min_gap_pct", self.fvg_min_gap_pct),
            ("ob_min_strength", self.ob_min_strength),
            ("liquidity_tolerance_pct", self.liquidity_tolerance_pct),
            ("structure_break_buffer_pct", self.structure_break_buffer_pct),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(field, "must be a non-negative number"));
            }
        }
        Ok(())
    }
}

/// Feature cache capacities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub max_order_blocks: usize,
    pub max_fvgs: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_order_blocks: DEFAULT_MAX_ORDER_BLOCKS,
            max_fvgs: DEFAULT_MAX_FVGS,
        }
    }
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

/// One tracked interval and the role it plays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntervalConfig {
    pub interval: Interval,
    pub role: IntervalRole,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Candles required before the interval goes live; defaults by role.
    #[serde(default)]
    pub min_candles: Option<usize>,
}

impl IntervalConfig {
    pub fn new(interval: Interval, role: IntervalRole) -> Self {
        Self {
            interval,
            role,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            min_candles: None,
        }
    }

    pub fn min_candles(&self) -> usize {
        self.min_candles
            .unwrap_or_else(|| self.role.default_min_candles())
    }
}

/// UTC time-of-day window in which signals may be emitted.
///
/// `end` before `start` wraps past midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KillZone {
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub label: Option<String>,
}

impl KillZone {
    /// Half-open: `start` is inside, `end` is not.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// The four determiners a composer is built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComponentsConfig {
    pub entry: ComponentConfig,
    pub stop_loss: ComponentConfig,
    pub take_profit: ComponentConfig,
    pub exit: ComponentConfig,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            entry: ComponentConfig::new("smart_money", &[]),
            stop_loss: ComponentConfig::new(
                "zone_based",
                &[("buffer_pct", 0.001), ("fallback_pct", 0.01)],
            ),
            take_profit: ComponentConfig::new("risk_reward", &[("ratio", 2.0)]),
            exit: ComponentConfig::new("structure_flip", &[]),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmartFlowConfig {
    pub symbols: Vec<String>,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub intervals: Vec<IntervalConfig>,
    #[serde(default)]
    pub kill_zones: Vec<KillZone>,
    #[serde(default)]
    pub gating: GatingPolicy,
    #[serde(default)]
    pub components: ComponentsConfig,
}

/// Errors raised while loading or validating a [`SmartFlowConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no symbols configured")]
    NoSymbols,
    #[error("no intervals configured")]
    NoIntervals,
    #[error("interval {0} configured twice")]
    DuplicateInterval(Interval),
    #[error("role {0} assigned to more than one interval")]
    DuplicateRole(IntervalRole),
    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
    #[error(transparent)]
    Component(#[from] FactoryError),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl SmartFlowConfig {
    /// Minimal configuration: one symbol on one interval acting as every role.
    pub fn single_interval(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbols: vec![symbol.into()],
            detection: DetectionConfig::default(),
            cache: CacheConfig::default(),
            intervals: vec![IntervalConfig::new(interval, IntervalRole::Ltf)],
            kill_zones: Vec::new(),
            gating: GatingPolicy::default(),
            components: ComponentsConfig::default(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        if self.intervals.is_empty() {
            return Err(ConfigError::NoIntervals);
        }
        self.detection.validate()?;
        if self.cache.max_order_blocks == 0 {
            return Err(ConfigError::invalid("cache.max_order_blocks", "must be >= 1"));
        }
        if self.cache.max_fvgs == 0 {
            return Err(ConfigError::invalid("cache.max_fvgs", "must be >= 1"));
        }

        let mut intervals = HashSet::new();
        let mut roles = HashSet::new();
        for ic in &self.intervals {
            if !intervals.insert(ic.interval) {
                return Err(ConfigError::DuplicateInterval(ic.interval));
            }
            if !roles.insert(ic.role) {
                return Err(ConfigError::DuplicateRole(ic.role));
            }
            let field = format!("intervals.{}", ic.interval);
            if ic.min_candles() == 0 {
                return Err(ConfigError::invalid(field, "min_candles must be >= 1"));
            }
            if ic.buffer_capacity < ic.min_candles() {
                return Err(ConfigError::invalid(
                    field,
                    format!(
                        "buffer_capacity {} is below min_candles {}",
                        ic.buffer_capacity,
                        ic.min_candles()
                    ),
                ));
            }
        }

        for (i, kz) in self.kill_zones.iter().enumerate() {
            if kz.start == kz.end {
                return Err(ConfigError::invalid(
                    format!("kill_zones[{i}]"),
                    "start and end must differ",
                ));
            }
        }

        self.gating.validate().map_err(|reason| ConfigError::invalid("gating", reason))?;
        build_composer(self)?;
        Ok(())
    }

    pub fn interval(&self, interval: Interval) -> Option<&IntervalConfig> {
        self.intervals.iter().find(|ic| ic.interval == interval)
    }

    /// First configured interval among `preference`, in order.
    pub fn resolve_role(&self, preference: &[IntervalRole]) -> Option<Interval> {
        preference.iter().find_map(|role| {
            self.intervals
                .iter()
                .find(|ic| ic.role == *role)
                .map(|ic| ic.interval)
        })
    }

    /// A fresh, uninitialized feature cache built from the thresholds.
    pub fn feature_cache(&self) -> FeatureStateCache {
        FeatureStateCache::new(
            self.detection.zone_detector(),
            self.detection.structure_tracker(),
            self.cache.max_order_blocks,
            self.cache.max_fvgs,
        )
    }

    /// True when no kill zone is configured or `time` falls inside one.
    pub fn in_kill_zone(&self, time: NaiveTime) -> bool {
        self.kill_zones.is_empty() || self.kill_zones.iter().any(|kz| kz.contains(time))
    }

    /// BLAKE3 hash of the canonical JSON form.
    ///
    /// serde_json with BTreeMap params produces deterministic key order.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
