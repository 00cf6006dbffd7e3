//! Signal composition: assembles the four determiners from config and runs
//! them in order.
//!
//! - `SignalComposer`: entry → stop-loss → take-profit → `Signal::new`.
//! - `build_composer`: factory orchestrator that builds all four components.
//! - `check_compatibility`: static compatibility rules (warnings, not errors).

use tracing::debug;

use crate::config::{ComponentsConfig, SmartFlowConfig};
use crate::domain::{InvalidSignalError, MarketStructureState, PriceContext, Side, Signal};

use super::entry::{EntryDeterminer, MarketContext};
use super::exit::{ExitDeterminer, ExitReason};
use super::factory::{create_entry, create_exit, create_stop_loss, create_take_profit, FactoryError};
use super::stop_loss::StopLossDeterminer;
use super::take_profit::TakeProfitDeterminer;

/// Result of one composition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeOutcome {
    /// The entry determiner declined.
    NoEntry,
    Emitted(Signal),
    /// Stop or target landed on the wrong side of entry; the signal was dropped.
    Discarded(InvalidSignalError),
}

// ─── SignalComposer ─────────────────────────────────────────────────

/// A fully assembled composer: four runtime determiners + a strategy tag.
pub struct SignalComposer {
    entry: Box<dyn EntryDeterminer>,
    stop_loss: Box<dyn StopLossDeterminer>,
    take_profit: Box<dyn TakeProfitDeterminer>,
    exit: Box<dyn ExitDeterminer>,
    strategy_tag: String,
}

impl SignalComposer {
    /// Tag defaults to `entry+stop_loss+take_profit`.
    pub fn new(
        entry: Box<dyn EntryDeterminer>,
        stop_loss: Box<dyn StopLossDeterminer>,
        take_profit: Box<dyn TakeProfitDeterminer>,
        exit: Box<dyn ExitDeterminer>,
    ) -> Self {
        let strategy_tag = format!("{}+{}+{}", entry.name(), stop_loss.name(), take_profit.name());
        Self {
            entry,
            stop_loss,
            take_profit,
            exit,
            strategy_tag,
        }
    }

    /// Suffix the tag with the first 12 hex digits of a config fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        let short: String = fingerprint.chars().take(12).collect();
        self.strategy_tag = format!("{}@{}", self.strategy_tag, short);
        self
    }

    pub fn strategy_tag(&self) -> &str {
        &self.strategy_tag
    }

    pub fn compose(&self, ctx: &MarketContext) -> ComposeOutcome {
        let Some(decision) = self.entry.analyze(ctx) else {
            return ComposeOutcome::NoEntry;
        };
        let price_ctx = PriceContext::from_decision(&decision, ctx.symbol.clone(), ctx.timestamp);
        let stop_loss = self.stop_loss.calculate(&price_ctx);
        let take_profit = self.take_profit.calculate(&price_ctx, stop_loss);
        debug!(
            symbol = %ctx.symbol,
            side = %decision.side,
            entry = decision.entry_price,
            stop_loss,
            take_profit,
            "entry decision priced"
        );

        match Signal::new(
            ctx.symbol.clone(),
            decision.side,
            decision.entry_price,
            stop_loss,
            take_profit,
            ctx.timestamp,
            self.strategy_tag.clone(),
        ) {
            Ok(signal) => ComposeOutcome::Emitted(signal),
            Err(err) => ComposeOutcome::Discarded(err),
        }
    }

    pub fn evaluate_exit(&self, side: Side, structure: &MarketStructureState) -> Option<ExitReason> {
        self.exit.should_exit(side, structure)
    }
}

impl std::fmt::Debug for SignalComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalComposer")
            .field("entry", &self.entry.name())
            .field("stop_loss", &self.stop_loss.name())
            .field("take_profit", &self.take_profit.name())
            .field("exit", &self.exit.name())
            .field("strategy_tag", &self.strategy_tag)
            .finish()
    }
}

// ─── Compatibility check ────────────────────────────────────────────

/// Result of a compatibility check between components.
#[derive(Debug, Clone)]
pub struct CompatibilityResult {
    pub warnings: Vec<String>,
}

impl CompatibilityResult {
    /// True if no warnings were produced.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Static compatibility rules between components.
/// Returns warnings, not errors. Every combination is allowed.
pub fn check_compatibility(components: &ComponentsConfig) -> CompatibilityResult {
    let mut warnings = Vec::new();

    let entry = components.entry.component_type.as_str();
    let sl = components.stop_loss.component_type.as_str();
    let tp = &components.take_profit;

    // zone_based stop without an entry that supplies zone extras
    if sl == "zone_based" && entry != "smart_money" {
        warnings.push(format!(
            "zone_based stop-loss with {entry} entry: no zone bounds, stop always uses fallback_pct"
        ));
    }

    if tp.component_type == "risk_reward" {
        let ratio = tp.params.get("ratio").copied().unwrap_or(2.0);
        if ratio < 1.0 {
            warnings.push(format!("risk_reward ratio {ratio} risks more than it targets"));
        }
    }

    CompatibilityResult { warnings }
}

// ─── build_composer ─────────────────────────────────────────────────

/// Build a `SignalComposer` from config.
///
/// Calls the four factory functions and runs the compatibility check
/// (warnings only, never blocks construction).
pub fn build_composer(config: &SmartFlowConfig) -> Result<SignalComposer, FactoryError> {
    let components = &config.components;
    let entry = create_entry(&components.entry, &config.gating)?;
    let stop_loss = create_stop_loss(&components.stop_loss)?;
    let take_profit = create_take_profit(&components.take_profit)?;
    let exit = create_exit(&components.exit)?;

    for warning in check_compatibility(components).warnings {
        debug!(%warning, "component compatibility");
    }

    Ok(SignalComposer::new(entry, stop_loss, take_profit, exit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Displacement, Sweep};
    use crate::components::stop_loss::PercentageStopLoss;
    use crate::components::take_profit::RiskRewardTakeProfit;
    use crate::components::{SmartMoneyEntry, StructureFlipExit};
    use crate::config::ComponentConfig;
    use crate::domain::{Direction, Interval, OrderBlock, SwingKind, Trend};
    use chrono::{TimeZone, Utc};

    fn ctx() -> MarketContext {
        let t = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        MarketContext {
            symbol: "BTCUSDT".into(),
            timestamp: t,
            price: 102.0,
            trend: Trend::Bullish,
            range: Some((100.0, 110.0)),
            order_blocks: vec![OrderBlock {
                anchor_time: t,
                formed_at: t,
                low: 100.0,
                high: 101.0,
                direction: Direction::Bullish,
                displacement_ratio: 2.5,
                mitigated: false,
            }],
            fvgs: vec![],
            sweep: Some(Sweep {
                side_swept: SwingKind::Low,
                direction: Direction::Bullish,
                level: 100.0,
                extreme: 99.5,
                time: t,
                confirmed_at: t,
            }),
            displacement: Some(Displacement {
                direction: Direction::Bullish,
                range: 3.0,
                time: t,
            }),
        }
    }

    #[test]
    fn default_config_emits_valid_long() {
        let config = SmartFlowConfig::single_interval("BTCUSDT", Interval::H1);
        let composer = build_composer(&config).unwrap();
        let ComposeOutcome::Emitted(signal) = composer.compose(&ctx()) else {
            panic!("expected a signal");
        };
        assert_eq!(signal.side(), Side::Long);
        assert_eq!(signal.entry_price(), 102.0);
        // Stop under the OB low with a 0.1% buffer, target at 2R.
        assert!((signal.stop_loss() - 99.9).abs() < 1e-9);
        assert!((signal.take_profit() - (102.0 + 2.0 * 2.1)).abs() < 1e-9);
        assert_eq!(signal.strategy_tag(), "smart_money+zone_based+risk_reward");
    }

    #[test]
    fn no_entry_when_conditions_fail() {
        let composer = build_composer(&SmartFlowConfig::single_interval("BTCUSDT", Interval::H1)).unwrap();
        let mut c = ctx();
        c.displacement = None;
        assert_eq!(composer.compose(&c), ComposeOutcome::NoEntry);
    }

    /// Stop-loss that always lands above entry.
    struct BrokenStop;

    impl StopLossDeterminer for BrokenStop {
        fn name(&self) -> &str {
            "broken"
        }

        fn calculate(&self, ctx: &PriceContext) -> f64 {
            ctx.entry_price + 1.0
        }
    }

    #[test]
    fn invalid_prices_are_discarded() {
        let composer = SignalComposer::new(
            Box::new(SmartMoneyEntry::default()),
            Box::new(BrokenStop),
            Box::new(RiskRewardTakeProfit::new(2.0)),
            Box::new(StructureFlipExit),
        );
        let ComposeOutcome::Discarded(err) = composer.compose(&ctx()) else {
            panic!("expected a discarded signal");
        };
        assert_eq!(err.stop_loss, 103.0);
    }

    #[test]
    fn fingerprint_suffix() {
        let composer = SignalComposer::new(
            Box::new(SmartMoneyEntry::default()),
            Box::new(PercentageStopLoss::new(0.01)),
            Box::new(RiskRewardTakeProfit::new(2.0)),
            Box::new(StructureFlipExit),
        )
        .with_fingerprint("0123456789abcdef0123");
        assert_eq!(composer.strategy_tag(), "smart_money+percentage+risk_reward@0123456789ab");
    }

    #[test]
    fn compat_warns_on_low_ratio() {
        let mut components = ComponentsConfig::default();
        assert!(check_compatibility(&components).is_clean());
        components.take_profit = ComponentConfig::new("risk_reward", &[("ratio", 0.5)]);
        assert_eq!(check_compatibility(&components).warnings.len(), 1);
    }
}
