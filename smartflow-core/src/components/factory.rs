//! Factory system: converts `ComponentConfig` into runtime trait objects.
//!
//! Four factory functions (`create_entry`, `create_stop_loss`,
//! `create_take_profit`, `create_exit`). Parameters are range-checked here so
//! a bad config surfaces as a `FactoryError` instead of a constructor panic.

use crate::config::ComponentConfig;

use super::entry::{EntryDeterminer, GatingPolicy, SmartMoneyEntry};
use super::exit::{ExitDeterminer, StructureFlipExit};
use super::stop_loss::{PercentageStopLoss, StopLossDeterminer, ZoneBasedStopLoss};
use super::take_profit::{PercentageTakeProfit, RiskRewardTakeProfit, TakeProfitDeterminer};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during component construction.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown entry type: {0}")]
    UnknownEntry(String),
    #[error("Unknown stop-loss type: {0}")]
    UnknownStopLoss(String),
    #[error("Unknown take-profit type: {0}")]
    UnknownTakeProfit(String),
    #[error("Unknown exit type: {0}")]
    UnknownExit(String),
    #[error("{component}.{param} = {value} is out of range ({expected})")]
    InvalidParam {
        component: String,
        param: String,
        value: f64,
        expected: &'static str,
    },
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Extract a named f64 parameter from a `ComponentConfig`, falling back to `default`.
fn param(config: &ComponentConfig, name: &str, default: f64) -> f64 {
    config.params.get(name).copied().unwrap_or(default)
}

/// Like [`param`], but the value must lie in `[min, max)`.
fn bounded_param(
    config: &ComponentConfig,
    name: &str,
    default: f64,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<f64, FactoryError> {
    let value = param(config, name, default);
    if value.is_finite() && value >= min && value < max {
        Ok(value)
    } else {
        Err(FactoryError::InvalidParam {
            component: config.component_type.clone(),
            param: name.to_string(),
            value,
            expected,
        })
    }
}

/// Strictly positive fraction below one.
fn fraction(config: &ComponentConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    bounded_param(config, name, default, f64::MIN_POSITIVE, 1.0, "0 < x < 1")
}

// ─── Entry factory ───────────────────────────────────────────────────

/// Create an entry determiner. The gating policy is global configuration.
pub fn create_entry(
    config: &ComponentConfig,
    gating: &GatingPolicy,
) -> Result<Box<dyn EntryDeterminer>, FactoryError> {
    match config.component_type.as_str() {
        "smart_money" => Ok(Box::new(SmartMoneyEntry::new(*gating))),
        other => Err(FactoryError::UnknownEntry(other.to_string())),
    }
}

// ─── Stop-loss factory ───────────────────────────────────────────────

pub fn create_stop_loss(
    config: &ComponentConfig,
) -> Result<Box<dyn StopLossDeterminer>, FactoryError> {
    match config.component_type.as_str() {
        "percentage" => {
            let stop_pct = fraction(config, "stop_pct", 0.01)?;
            Ok(Box::new(PercentageStopLoss::new(stop_pct)))
        }
        "zone_based" => {
            let buffer_pct = bounded_param(config, "buffer_pct", 0.001, 0.0, 1.0, "0 <= x < 1")?;
            let fallback_pct = fraction(config, "fallback_pct", 0.01)?;
            Ok(Box::new(ZoneBasedStopLoss::new(buffer_pct, fallback_pct)))
        }
        other => Err(FactoryError::UnknownStopLoss(other.to_string())),
    }
}

// ─── Take-profit factory ─────────────────────────────────────────────

pub fn create_take_profit(
    config: &ComponentConfig,
) -> Result<Box<dyn TakeProfitDeterminer>, FactoryError> {
    match config.component_type.as_str() {
        "risk_reward" => {
            let ratio = bounded_param(config, "ratio", 2.0, f64::MIN_POSITIVE, f64::INFINITY, "x > 0")?;
            Ok(Box::new(RiskRewardTakeProfit::new(ratio)))
        }
        "percentage" => {
            let target_pct = fraction(config, "target_pct", 0.02)?;
            Ok(Box::new(PercentageTakeProfit::new(target_pct)))
        }
        other => Err(FactoryError::UnknownTakeProfit(other.to_string())),
    }
}

// ─── Exit factory ────────────────────────────────────────────────────

pub fn create_exit(config: &ComponentConfig) -> Result<Box<dyn ExitDeterminer>, FactoryError> {
    match config.component_type.as_str() {
        "structure_flip" => Ok(Box::new(StructureFlipExit)),
        other => Err(FactoryError::UnknownExit(other.to_string())),
    }
}
