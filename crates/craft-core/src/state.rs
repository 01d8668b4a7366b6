//! Resource-counted world state: item → agent → count, plus per-agent time.

use std::collections::BTreeMap;

use craft_contracts::Quantities;
use serde::{Deserialize, Serialize};

/// Lookups of unknown item/agent combinations read as zero. Counts are
/// unsigned and every addition and subtraction is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftState {
    pub resources: BTreeMap<String, BTreeMap<String, u64>>,
    pub time: BTreeMap<String, u64>,
}

impl CraftState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, item: &str, agent: &str) -> u64 {
        self.resources
            .get(item)
            .and_then(|by_agent| by_agent.get(agent))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_at_least(&self, item: &str, agent: &str, qty: u64) -> bool {
        self.count(item, agent) >= qty
    }

    pub fn set_count(&mut self, item: &str, agent: &str, qty: u64) {
        self.resources
            .entry(item.to_string())
            .or_default()
            .insert(agent.to_string(), qty);
    }

    /// Returns false and leaves the state untouched when the count would
    /// overflow.
    pub fn add(&mut self, item: &str, agent: &str, qty: u64) -> bool {
        let Some(total) = self.count(item, agent).checked_add(qty) else {
            return false;
        };
        self.set_count(item, agent, total);
        true
    }

    /// Subtracts `qty`. Returns false and leaves the state untouched when the
    /// agent holds less than `qty`.
    pub fn remove(&mut self, item: &str, agent: &str, qty: u64) -> bool {
        let Some(remaining) = self.count(item, agent).checked_sub(qty) else {
            return false;
        };
        self.set_count(item, agent, remaining);
        true
    }

    pub fn time_left(&self, agent: &str) -> u64 {
        self.time.get(agent).copied().unwrap_or(0)
    }

    pub fn set_time(&mut self, agent: &str, budget: u64) {
        self.time.insert(agent.to_string(), budget);
    }

    pub fn spend_time(&mut self, agent: &str, cost: u64) -> bool {
        let Some(remaining) = self.time_left(agent).checked_sub(cost) else {
            return false;
        };
        self.set_time(agent, remaining);
        true
    }

    pub fn holdings(&self, agent: &str) -> BTreeMap<String, u64> {
        self.resources
            .iter()
            .filter_map(|(item, by_agent)| {
                let count = by_agent.get(agent).copied().unwrap_or(0);
                (count > 0).then(|| (item.clone(), count))
            })
            .collect()
    }

    pub fn satisfies(&self, goals: &Quantities, agent: &str) -> bool {
        goals
            .iter()
            .all(|(item, qty)| self.has_at_least(item, agent, *qty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entries_read_as_zero() {
        let state = CraftState::new();
        assert_eq!(state.count("wood", "agent"), 0);
        assert_eq!(state.time_left("agent"), 0);
        assert!(state.has_at_least("wood", "agent", 0));
    }

    #[test]
    fn add_creates_missing_entry() {
        let mut state = CraftState::new();
        assert!(state.add("plank", "agent", 4));
        assert!(state.add("plank", "agent", 1));
        assert_eq!(state.count("plank", "agent"), 5);
    }

    #[test]
    fn add_refuses_to_overflow() {
        let mut state = CraftState::new();
        state.set_count("rail", "agent", u64::MAX - 1);
        let before = state.clone();
        assert!(!state.add("rail", "agent", 2));
        assert_eq!(state, before);
        assert!(state.add("rail", "agent", 1));
        assert_eq!(state.count("rail", "agent"), u64::MAX);
    }

    #[test]
    fn remove_refuses_to_go_negative() {
        let mut state = CraftState::new();
        state.set_count("wood", "agent", 1);
        let before = state.clone();
        assert!(!state.remove("wood", "agent", 2));
        assert_eq!(state, before);
        assert!(state.remove("wood", "agent", 1));
        assert_eq!(state.count("wood", "agent"), 0);
    }

    #[test]
    fn spend_time_is_checked() {
        let mut state = CraftState::new();
        state.set_time("agent", 5);
        assert!(!state.spend_time("agent", 6));
        assert_eq!(state.time_left("agent"), 5);
        assert!(state.spend_time("agent", 5));
        assert_eq!(state.time_left("agent"), 0);
    }

    #[test]
    fn agents_are_tracked_separately() {
        let mut state = CraftState::new();
        state.set_count("wood", "alice", 3);
        assert_eq!(state.count("wood", "bob"), 0);
        assert_eq!(state.holdings("alice").get("wood"), Some(&3));
        assert!(state.holdings("bob").is_empty());
    }

    #[test]
    fn satisfies_checks_every_goal() {
        let mut state = CraftState::new();
        state.set_count("cart", "agent", 1);
        state.set_count("rail", "agent", 9);
        let mut goals = Quantities::new();
        goals.insert("cart".to_string(), 1);
        assert!(state.satisfies(&goals, "agent"));
        goals.insert("rail".to_string(), 10);
        assert!(!state.satisfies(&goals, "agent"));
    }
}
