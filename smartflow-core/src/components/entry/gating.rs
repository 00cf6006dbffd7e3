//! Entry gating policies.
//!
//! The baseline is conjunctive: every condition must hold. The weighted
//! policy trades some conditions against each other, but it is versioned and
//! has no default threshold, so it is never switched on by accident. A
//! trending market is mandatory under both policies.

use serde::{Deserialize, Serialize};

/// Which entry conditions held for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConditions {
    /// Trend is not sideways.
    pub trending: bool,
    /// Price sits in discount (long) or premium (short) of the dealing range.
    pub in_zone: bool,
    /// At least one active order block or FVG agrees with the trend.
    pub zone_confluence: bool,
    /// A recent liquidity sweep implies the trend direction.
    pub sweep: bool,
    /// A recent displacement candle moved in the trend direction.
    pub displacement: bool,
}

impl EntryConditions {
    pub fn all(&self) -> bool {
        self.trending && self.in_zone && self.zone_confluence && self.sweep && self.displacement
    }
}

/// Score contributed by each optional condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionWeights {
    pub in_zone: f64,
    pub zone_confluence: f64,
    pub sweep: f64,
    pub displacement: f64,
}

impl Default for ConditionWeights {
    fn default() -> Self {
        Self {
            in_zone: 1.0,
            zone_confluence: 1.0,
            sweep: 1.0,
            displacement: 1.0,
        }
    }
}

impl ConditionWeights {
    fn total(&self) -> f64 {
        self.in_zone + self.zone_confluence + self.sweep + self.displacement
    }
}

/// Weighted-score gating parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePolicy {
    pub version: u32,
    #[serde(default)]
    pub weights: ConditionWeights,
    /// Minimum score to admit an entry. Deliberately has no default.
    pub threshold: f64,
}

impl ScorePolicy {
    pub fn score(&self, conditions: &EntryConditions) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;
        if conditions.in_zone {
            score += w.in_zone;
        }
        if conditions.zone_confluence {
            score += w.zone_confluence;
        }
        if conditions.sweep {
            score += w.sweep;
        }
        if conditions.displacement {
            score += w.displacement;
        }
        score
    }
}

/// How entry conditions combine into a go / no-go decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum GatingPolicy {
    #[default]
    Conjunctive,
    WeightedScore(ScorePolicy),
}

impl GatingPolicy {
    pub fn admits(&self, conditions: &EntryConditions) -> bool {
        if !conditions.trending {
            return false;
        }
        match self {
            GatingPolicy::Conjunctive => conditions.all(),
            GatingPolicy::WeightedScore(policy) => policy.score(conditions) >= policy.threshold,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let GatingPolicy::WeightedScore(policy) = self else {
            return Ok(());
        };
        if policy.version == 0 {
            return Err("weighted_score version must be >= 1".into());
        }
        let w = &policy.weights;
        for (name, weight) in [
            ("in_zone", w.in_zone),
            ("zone_confluence", w.zone_confluence),
            ("sweep", w.sweep),
            ("displacement", w.displacement),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(format!("weight {name} must be a non-negative number"));
            }
        }
        if !(policy.threshold.is_finite() && policy.threshold > 0.0) {
            return Err("weighted_score threshold must be a positive number".into());
        }
        if policy.threshold > w.total() {
            return Err(format!(
                "threshold {} exceeds the maximum score {}",
                policy.threshold,
                w.total()
            ));
        }
        Ok(())
    }
}
