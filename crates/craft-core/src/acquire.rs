//! Recipe-independent methods: `have_enough` and the `produce` dispatcher.

use craft_contracts::task::{HAVE_ENOUGH, PRODUCE};
use craft_contracts::Task;
use tracing::debug;

use crate::htn::{Domain, Method};
use crate::state::CraftState;

/// Reads `(item, qty)` from a `have_enough` task.
fn goal_args(task: &Task) -> Option<(&str, u64)> {
    let item = task.name_arg(0)?;
    let qty = task.count_arg(1)?;
    Some((item, qty))
}

/// Nothing left to do when the agent already holds `qty` of the item.
pub fn check_enough(state: &CraftState, task: &Task) -> Option<Vec<Task>> {
    let Some((item, qty)) = goal_args(task) else {
        debug!(task = %task, "malformed have_enough task");
        return None;
    };
    state
        .has_at_least(item, &task.agent, qty)
        .then(Vec::new)
}

/// Produce one more batch of the item, then check again.
pub fn produce_enough(_state: &CraftState, task: &Task) -> Option<Vec<Task>> {
    let (item, _) = goal_args(task)?;
    Some(vec![Task::produce(task.agent.as_str(), item), task.clone()])
}

/// `produce(agent, item)` → `produce_<item>(agent)`.
pub fn produce(_state: &CraftState, task: &Task) -> Option<Vec<Task>> {
    let item = task.name_arg(0)?;
    Some(vec![Task::produce_item(task.agent.as_str(), item)])
}

/// Register `have_enough` (check first, then produce) and `produce`.
pub fn declare_acquisition_methods(domain: &mut Domain<CraftState>) {
    domain.declare_methods(
        HAVE_ENOUGH,
        [
            Method::new("check_enough", check_enough),
            Method::new("produce_enough", produce_enough),
        ],
    );
    domain.declare_methods(PRODUCE, [Method::new("produce", produce)]);
}
