//! Signal components: the four-determiner composition model.
//!
//! Every signal is composed by exactly four independent determiners:
//! - Entry: reads cached features, decides side and entry price
//! - Stop-loss: places the protective stop from the entry's price context
//! - Take-profit: places the target from the context and the stop
//! - Exit: reports when live structure invalidates an open idea
//!
//! Each is a closed trait with a small set of implementations, selected from
//! configuration by the [`factory`] and injected into a [`SignalComposer`].

pub mod composition;
pub mod entry;
pub mod exit;
pub mod factory;
pub mod stop_loss;
pub mod take_profit;

pub use composition::{
    build_composer, check_compatibility, CompatibilityResult, ComposeOutcome, SignalComposer,
};
pub use entry::{
    ConditionWeights, EntryConditions, EntryDeterminer, GatingPolicy, MarketContext, ScorePolicy,
    SmartMoneyEntry,
};
pub use exit::{ExitDeterminer, ExitReason, StructureFlipExit};
pub use factory::{create_entry, create_exit, create_stop_loss, create_take_profit, FactoryError};
pub use stop_loss::{PercentageStopLoss, StopLossDeterminer, ZoneBasedStopLoss};
pub use take_profit::{PercentageTakeProfit, RiskRewardTakeProfit, TakeProfitDeterminer};
