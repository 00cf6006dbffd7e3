use crate::domain::{MarketStructureState, Side};

use super::{ExitDeterminer, ExitReason};

/// Exit when the latest structure event is a CHoCH against the position.
#[derive(Debug, Clone, Default)]
pub struct StructureFlipExit;

impl ExitDeterminer for StructureFlipExit {
    fn name(&self) -> &str {
        "structure_flip"
    }

    fn should_exit(&self, side: Side, structure: &MarketStructureState) -> Option<ExitReason> {
        let event = structure.last_event?;
        if event.is_choch() && event.direction != side.direction() {
            Some(ExitReason::StructureFlip { event })
        } else {
            None
        }
    }
}
