//! Exit determination. Query-only: the engine tracks no open positions.

pub mod structure_flip;

pub use structure_flip::StructureFlipExit;

use serde::{Deserialize, Serialize};

use crate::domain::{MarketStructureState, Side, StructureEvent};

/// Why an open idea should be closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExitReason {
    /// A change of character broke structure against the position.
    StructureFlip { event: StructureEvent },
}

/// Trait for exit determiners.
pub trait ExitDeterminer: Send + Sync {
    fn name(&self) -> &str;

    fn should_exit(&self, side: Side, structure: &MarketStructureState) -> Option<ExitReason>;
}
