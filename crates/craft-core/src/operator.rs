//! Operator synthesis: one primitive action per recipe.
//!
//! An operator checks that the acting agent holds every required tool, every
//! consumed input, and enough time, and only then applies the recipe's
//! effects. Failures leave the state untouched. Shortfalls are reported in the
//! order requires → consumes → time, then count overflow.

use craft_contracts::task::OPERATOR_PREFIX;
use craft_contracts::{RecipeBook, RecipeRule, Task};
use thiserror::Error;

use crate::htn::{Infeasible, Operator};
use crate::state::CraftState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorFailure {
    #[error("insufficient {item}: need {needed}, have {available}")]
    InsufficientResource {
        item: String,
        needed: u64,
        available: u64,
    },

    #[error("insufficient time: need {needed}, have {available}")]
    InsufficientTime { needed: u64, available: u64 },

    #[error("producing {produced} more {item} would overflow its count")]
    CountOverflow { item: String, produced: u64 },
}

impl From<OperatorFailure> for Infeasible {
    fn from(value: OperatorFailure) -> Self {
        Infeasible(value.to_string())
    }
}

/// `op_` + recipe name with spaces replaced by underscores.
pub fn operator_name(recipe_name: &str) -> String {
    format!("{OPERATOR_PREFIX}{}", recipe_name.replace(' ', "_"))
}

// ---------------------------------------------------------------------------
// CraftOperator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftOperator {
    name: String,
    recipe: String,
    rule: RecipeRule,
}

impl CraftOperator {
    pub fn synthesize(recipe_name: &str, rule: &RecipeRule) -> Self {
        Self {
            name: operator_name(recipe_name),
            recipe: recipe_name.to_string(),
            rule: rule.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    /// Validate every precondition without touching the state.
    pub fn check(&self, state: &CraftState, agent: &str) -> Result<(), OperatorFailure> {
        for (item, needed) in self.rule.requires.iter().chain(self.rule.consumes.iter()) {
            let available = state.count(item, agent);
            if available < *needed {
                return Err(OperatorFailure::InsufficientResource {
                    item: item.clone(),
                    needed: *needed,
                    available,
                });
            }
        }

        if self.rule.time > 0 {
            let available = state.time_left(agent);
            if available < self.rule.time {
                return Err(OperatorFailure::InsufficientTime {
                    needed: self.rule.time,
                    available,
                });
            }
        }

        for (item, qty) in &self.rule.produces {
            let consumed = self.rule.consumes.get(item).copied().unwrap_or(0);
            let after_consume = state.count(item, agent).saturating_sub(consumed);
            if after_consume.checked_add(*qty).is_none() {
                return Err(OperatorFailure::CountOverflow {
                    item: item.clone(),
                    produced: *qty,
                });
            }
        }

        Ok(())
    }

    /// Apply the recipe for `agent`: consume inputs, add outputs, charge time.
    pub fn apply(&self, state: &mut CraftState, agent: &str) -> Result<(), OperatorFailure> {
        self.check(state, agent)?;

        for (item, qty) in &self.rule.consumes {
            let removed = state.remove(item, agent, *qty);
            debug_assert!(removed, "consume of {item} passed check but failed");
        }
        for (item, qty) in &self.rule.produces {
            let added = state.add(item, agent, *qty);
            debug_assert!(added, "produce of {item} passed check but overflowed");
        }
        if self.rule.time > 0 {
            let spent = state.spend_time(agent, self.rule.time);
            debug_assert!(spent, "time charge passed check but failed");
        }

        Ok(())
    }

    /// Wrap as an engine operator. The acting agent is read from the task.
    pub fn into_operator(self) -> Operator<CraftState> {
        let name = self.name.clone();
        Operator::new(name, move |state: &mut CraftState, task: &Task| {
            self.apply(state, &task.agent).map_err(Infeasible::from)
        })
    }
}

/// One operator per recipe, in declaration order.
pub fn synthesize_operators(book: &RecipeBook) -> Vec<CraftOperator> {
    book.recipes
        .iter()
        .map(|(name, rule)| CraftOperator::synthesize(name, rule))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
