//! v1 data contracts shared by the crafting compiler, search engine, and CLI.
//!
//! Recipe documents, task tuples, and plan reports live here so that both the
//! library and the binary speak the same serialized shapes.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod task;

pub use task::{Task, TaskArg};

pub const SCHEMA_VERSION_V1: &str = "1.0";
pub const DEFAULT_AGENT_ID: &str = "agent";

pub type Quantities = IndexMap<String, u64>;

// ---------------------------------------------------------------------------
// Recipe document
// ---------------------------------------------------------------------------

/// Every field is optional in the document; a rule with no fields at all is a
/// legal no-cost, no-effect recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RecipeRule {
    /// Tools: must be present, never consumed.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub requires: Quantities,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub consumes: Quantities,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub produces: Quantities,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub time: u64,
}

impl RecipeRule {
    pub fn is_noop(&self) -> bool {
        self.requires.is_empty()
            && self.consumes.is_empty()
            && self.produces.is_empty()
            && self.time == 0
    }

    /// Every item this rule mentions, requires first, then consumes, then produces.
    pub fn referenced_items(&self) -> impl Iterator<Item = &str> {
        self.requires
            .keys()
            .chain(self.consumes.keys())
            .chain(self.produces.keys())
            .map(String::as_str)
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RecipeBook {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub recipes: IndexMap<String, RecipeRule>,
    #[serde(default)]
    pub initial: Quantities,
    #[serde(default)]
    pub goal: Quantities,
}

impl RecipeBook {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Declared items followed by declared tools.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .chain(self.tools.iter())
            .map(String::as_str)
    }

    pub fn is_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool == name)
    }
}

// ---------------------------------------------------------------------------
// Plan reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchStats {
    pub expansions: u64,
    pub operator_applications: u64,
    pub operator_failures: u64,
    pub method_failures: u64,
    pub pruned: u64,
    pub max_depth: usize,
    /// The expansion budget ran out before the search finished.
    #[serde(default)]
    pub exhausted: bool,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expansions={} operators={} operator_failures={} method_failures={} pruned={} max_depth={} exhausted={}",
            self.expansions,
            self.operator_applications,
            self.operator_failures,
            self.method_failures,
            self.pruned,
            self.max_depth,
            self.exhausted
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanReport {
    pub schema_version: String,
    pub agent_id: String,
    pub goals: Vec<Task>,
    pub steps: Vec<Task>,
    /// Non-zero holdings of the agent after every step has been applied.
    pub final_resources: BTreeMap<String, u64>,
    pub time_remaining: u64,
    pub stats: SearchStats,
}

impl PlanReport {
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "plan for {} ({} steps):", self.agent_id, self.steps.len())?;
        for (idx, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {:>3}. {}", idx + 1, step)?;
        }
        let holdings = self
            .final_resources
            .iter()
            .map(|(item, count)| format!("{item}={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "final: {holdings}")?;
        write!(f, "time_remaining={} {}", self.time_remaining, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_book_parses_pascal_case_document() {
        let book = RecipeBook::from_json_str(
            r#"{
                "Items": ["wood", "plank"],
                "Tools": ["bench"],
                "Recipes": {
                    "craft plank": {"Consumes": {"wood": 1}, "Produces": {"plank": 4}, "Time": 1},
                    "punch for wood": {"Produces": {"wood": 1}, "Time": 4}
                },
                "Initial": {"wood": 2},
                "Goal": {"plank": 1}
            }"#,
        )
        .expect("valid document");

        assert_eq!(book.items, vec!["wood", "plank"]);
        assert!(book.is_tool("bench"));
        assert_eq!(book.recipes.len(), 2);
        let plank = &book.recipes["craft plank"];
        assert_eq!(plank.consumes.get("wood"), Some(&1));
        assert_eq!(plank.produces.get("plank"), Some(&4));
        assert_eq!(plank.time, 1);
        assert!(plank.requires.is_empty());
        assert_eq!(book.initial.get("wood"), Some(&2));
        assert_eq!(book.goal.get("plank"), Some(&1));
    }

    #[test]
    fn recipe_order_follows_the_document() {
        let book = RecipeBook::from_json_str(
            r#"{"Recipes": {"zeta": {}, "alpha": {}, "mid": {}}}"#,
        )
        .expect("valid document");
        let names = book.recipes.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn rule_fields_keep_declared_order() {
        let rule: RecipeRule = serde_json::from_str(
            r#"{"Consumes": {"stick": 2, "plank": 3}, "Requires": {"bench": 1}}"#,
        )
        .expect("valid rule");
        let consumed = rule.consumes.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(consumed, vec!["stick", "plank"]);
        let referenced = rule.referenced_items().collect::<Vec<_>>();
        assert_eq!(referenced, vec!["bench", "stick", "plank"]);
    }

    #[test]
    fn empty_rule_is_noop() {
        let rule: RecipeRule = serde_json::from_str("{}").expect("empty rule");
        assert!(rule.is_noop());
        assert_eq!(serde_json::to_string(&rule).expect("serialize"), "{}");
    }

    #[test]
    fn negative_quantities_are_rejected() {
        let parsed = serde_json::from_str::<RecipeRule>(r#"{"Consumes": {"wood": -1}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let book = RecipeBook::from_json_str("{}").expect("empty document");
        assert!(book.items.is_empty());
        assert!(book.recipes.is_empty());
        assert!(book.goal.is_empty());
    }
}
