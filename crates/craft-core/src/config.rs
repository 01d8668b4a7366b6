//! Planner configuration with environment overrides.

use craft_contracts::DEFAULT_AGENT_ID;
use serde::{Deserialize, Serialize};

use crate::htn::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_EXPANSIONS};

pub const ENV_AGENT_ID: &str = "CRAFT_AGENT_ID";
pub const ENV_MAX_DEPTH: &str = "CRAFT_MAX_DEPTH";
pub const ENV_MAX_EXPANSIONS: &str = "CRAFT_MAX_EXPANSIONS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannerConfig {
    pub agent_id: String,
    pub time_budget: u64,
    /// Deeper branches are pruned.
    pub max_depth: usize,
    pub max_expansions: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            agent_id: DEFAULT_AGENT_ID.to_string(),
            time_budget: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }
}

impl PlannerConfig {
    pub fn with_time_budget(mut self, time_budget: u64) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: u64) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    /// Defaults with `CRAFT_*` overrides from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Blank or unparsable values are
    /// ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(agent_id) = lookup(ENV_AGENT_ID).filter(|value| !value.trim().is_empty()) {
            self.agent_id = agent_id.trim().to_string();
        }
        if let Some(max_depth) = lookup(ENV_MAX_DEPTH).and_then(|value| value.trim().parse().ok())
        {
            self.max_depth = max_depth;
        }
        if let Some(max_expansions) =
            lookup(ENV_MAX_EXPANSIONS).and_then(|value| value.trim().parse().ok())
        {
            self.max_expansions = max_expansions;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let config = PlannerConfig::default();
        assert_eq!(config.agent_id, "agent");
        assert_eq!(config.time_budget, 0);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_expansions, DEFAULT_MAX_EXPANSIONS);
    }

    #[test]
    fn overrides_apply_and_ignore_garbage() {
        let config = PlannerConfig::default().with_overrides(|key| match key {
            ENV_AGENT_ID => Some(" steve ".to_string()),
            ENV_MAX_DEPTH => Some("deep".to_string()),
            _ => None,
        });
        assert_eq!(config.agent_id, "steve");
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);

        let config = PlannerConfig::default().with_overrides(|key| match key {
            ENV_AGENT_ID => Some("   ".to_string()),
            ENV_MAX_DEPTH => Some("128".to_string()),
            ENV_MAX_EXPANSIONS => Some(" 5000 ".to_string()),
            _ => None,
        });
        assert_eq!(config.agent_id, "agent");
        assert_eq!(config.max_depth, 128);
        assert_eq!(config.max_expansions, 5_000);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PlannerConfig::default().with_time_budget(300);
        let encoded = serde_json::to_string(&config).expect("serialize");
        let decoded: PlannerConfig = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(config, decoded);
    }
}
