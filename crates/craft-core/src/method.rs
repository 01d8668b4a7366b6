//! Method synthesis: "how to produce X" for every recipe.

use craft_contracts::task::PRODUCE_PREFIX;
use craft_contracts::{RecipeBook, RecipeRule, Task};

use crate::htn::Method;
use crate::operator::operator_name;
use crate::state::CraftState;

/// The item a recipe's method is registered for.
///
/// Recipe names end with the item they make ("punch for wood"), so the last
/// word wins when the rule actually produces it. Names like
/// "craft wooden_axe at bench" end in a tool instead; those fall back to the
/// first produced item. A rule that produces nothing keeps the last word.
pub fn method_item(recipe_name: &str, rule: &RecipeRule) -> String {
    let last_word = recipe_name.split(' ').next_back().unwrap_or(recipe_name);
    if rule.produces.contains_key(last_word) {
        return last_word.to_string();
    }
    rule.produces
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| last_word.to_string())
}

pub fn method_name(recipe_name: &str, rule: &RecipeRule) -> String {
    format!("{PRODUCE_PREFIX}{}", method_item(recipe_name, rule))
}

/// Decomposition synthesized from one recipe rule. It never checks
/// feasibility itself; the prerequisite tasks and the operator do that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftMethod {
    name: String,
    recipe: String,
    rule: RecipeRule,
}

impl CraftMethod {
    pub fn synthesize(recipe_name: &str, rule: &RecipeRule) -> Self {
        Self {
            name: method_name(recipe_name, rule),
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

    /// Tools first, then consumables, then the recipe's operator.
    pub fn decompose(&self, agent: &str) -> Vec<Task> {
        let mut subtasks = Vec::with_capacity(
            self.rule.requires.len() + self.rule.consumes.len() + 1,
        );
        for (item, qty) in &self.rule.requires {
            subtasks.push(Task::have_enough(agent, item.as_str(), *qty));
        }
        for (item, qty) in &self.rule.consumes {
            subtasks.push(Task::have_enough(agent, item.as_str(), *qty));
        }
        subtasks.push(Task::new(operator_name(&self.recipe), agent));
        subtasks
    }

    /// Wrap as an engine method, labelled by the recipe it came from.
    pub fn into_method(self) -> Method<CraftState> {
        let label = self.recipe.clone();
        Method::new(label, move |_state: &CraftState, task: &Task| {
            Some(self.decompose(&task.agent))
        })
    }
}

/// One method per recipe, in declaration order. Recipes that make the same
/// item end up as alternatives under the same name, in this order.
pub fn synthesize_methods(book: &RecipeBook) -> Vec<CraftMethod> {
    book.recipes
        .iter()
        .map(|(name, rule)| CraftMethod::synthesize(name, rule))
        .collect()
}
