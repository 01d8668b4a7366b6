//! Built-in planning scenarios for the sample recipe table.

use craft_contracts::Quantities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub id: u8,
    pub time_budget: u64,
    pub initial: &'static [(&'static str, u64)],
    pub goals: &'static [(&'static str, u64)],
}

impl Scenario {
    pub fn initial_counts(&self) -> Quantities {
        to_quantities(self.initial)
    }

    pub fn goal_counts(&self) -> Quantities {
        to_quantities(self.goals)
    }
}

pub const SCENARIOS: [Scenario; 5] = [
    Scenario {
        id: 1,
        time_budget: 0,
        initial: &[("plank", 1)],
        goals: &[("plank", 1)],
    },
    Scenario {
        id: 2,
        time_budget: 300,
        initial: &[],
        goals: &[("plank", 1)],
    },
    Scenario {
        id: 3,
        time_budget: 10,
        initial: &[],
        goals: &[("wooden_pickaxe", 1)],
    },
    Scenario {
        id: 4,
        time_budget: 100,
        initial: &[],
        goals: &[("iron_pickaxe", 1)],
    },
    Scenario {
        id: 5,
        time_budget: 175,
        initial: &[],
        goals: &[("cart", 1), ("rail", 10)],
    },
];

pub fn scenario(id: u8) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.id == id)
}

fn to_quantities(entries: &[(&str, u64)]) -> Quantities {
    entries
        .iter()
        .map(|(item, qty)| (item.to_string(), *qty))
        .collect()
}
