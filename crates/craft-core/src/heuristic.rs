//! Pruning heuristic for the crafting domain.

use std::fmt;

use tracing::trace;

use crate::htn::{PruneContext, PruningCheck};
use crate::state::CraftState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    /// A `produce_<item>` task with no time left to act.
    OutOfTime,
    /// The task is already being expanded further up the call stack.
    Cycle,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfTime => f.write_str("out_of_time"),
            Self::Cycle => f.write_str("cycle"),
        }
    }
}

/// Vetoes production without time budget and self-referential expansion.
/// The agent whose budget is checked is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruningHeuristic {
    agent_id: String,
}

impl PruningHeuristic {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// First matching rule wins.
    pub fn verdict(&self, ctx: &PruneContext<'_, CraftState>) -> Option<PruneReason> {
        if ctx.task.is_item_production() && ctx.state.time_left(&self.agent_id) == 0 {
            return Some(PruneReason::OutOfTime);
        }
        if ctx.task_in_call_stack() {
            return Some(PruneReason::Cycle);
        }
        None
    }
}

impl PruningCheck<CraftState> for PruningHeuristic {
    fn should_prune(&self, ctx: &PruneContext<'_, CraftState>) -> bool {
        match self.verdict(ctx) {
            Some(reason) => {
                trace!(task = %ctx.task, depth = ctx.depth, %reason, "pruning");
                true
            }
            None => false,
        }
    }
}
