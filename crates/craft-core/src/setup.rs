//! Initial state and goal list construction.

use craft_contracts::{Quantities, RecipeBook, Task};

use crate::state::CraftState;

/// Zero every declared item and tool for `agent`, then apply `initial` on top
/// and set the agent's time budget.
///
/// Duplicate vocabulary entries are harmless here; rejecting them is the
/// loader's job (see [`crate::recipes::validate`]).
pub fn build_initial_state(
    book: &RecipeBook,
    agent: &str,
    time_budget: u64,
    initial: &Quantities,
) -> CraftState {
    let mut state = CraftState::new();
    state.set_time(agent, time_budget);

    for name in book.vocabulary() {
        state.set_count(name, agent, 0);
    }
    for (name, qty) in initial {
        state.set_count(name, agent, *qty);
    }

    state
}

/// One `have_enough` task per goal entry, in the mapping's order. The search
/// works goals left to right, so this order is part of the contract.
pub fn build_goal_list(goals: &Quantities, agent: &str) -> Vec<Task> {
    goals
        .iter()
        .map(|(item, qty)| Task::have_enough(agent, item.as_str(), *qty))
        .collect()
}
