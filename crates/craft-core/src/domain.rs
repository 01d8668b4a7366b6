//! Compiles a recipe book into a searchable domain and solves crafting goals.

use craft_contracts::{PlanReport, Quantities, RecipeBook, Task, SCHEMA_VERSION_V1};
use tracing::{debug, info};

use crate::acquire::declare_acquisition_methods;
use crate::config::PlannerConfig;
use crate::heuristic::PruningHeuristic;
use crate::htn::{Domain, Plan, PlanError, Planner};
use crate::method::synthesize_methods;
use crate::operator::synthesize_operators;
use crate::setup::{build_goal_list, build_initial_state};
use crate::state::CraftState;

/// Register acquisition methods, one method and one operator per recipe, and
/// the pruning heuristic bound to `agent_id`.
pub fn compile_domain(book: &RecipeBook, agent_id: &str) -> Domain<CraftState> {
    let mut domain = Domain::new();

    domain.declare_operators(
        synthesize_operators(book)
            .into_iter()
            .map(|operator| operator.into_operator()),
    );

    declare_acquisition_methods(&mut domain);
    for method in synthesize_methods(book) {
        let task_name = method.name().to_string();
        domain.declare_methods(&task_name, [method.into_method()]);
    }

    domain.add_pruning_check(PruningHeuristic::new(agent_id));

    debug!(
        operators = domain.operator_names().len(),
        method_tasks = domain.method_table().len(),
        agent = agent_id,
        "domain compiled"
    );
    domain
}

/// A ready-to-solve planning problem for one agent.
#[derive(Debug)]
pub struct CraftingProblem {
    pub config: PlannerConfig,
    pub initial_state: CraftState,
    pub goal_counts: Quantities,
    pub domain: Domain<CraftState>,
}

impl CraftingProblem {
    /// Initial counts and goal come from the book's `Initial` and `Goal`.
    pub fn from_book(book: &RecipeBook, config: PlannerConfig) -> Self {
        Self::new(book, config, &book.initial, book.goal.clone())
    }

    pub fn new(
        book: &RecipeBook,
        config: PlannerConfig,
        initial: &Quantities,
        goal_counts: Quantities,
    ) -> Self {
        let initial_state =
            build_initial_state(book, &config.agent_id, config.time_budget, initial);
        let domain = compile_domain(book, &config.agent_id);
        Self {
            config,
            initial_state,
            goal_counts,
            domain,
        }
    }

    pub fn with_initial_count(mut self, item: &str, qty: u64) -> Self {
        self.initial_state
            .set_count(item, &self.config.agent_id, qty);
        self
    }

    pub fn goals(&self) -> Vec<Task> {
        build_goal_list(&self.goal_counts, &self.config.agent_id)
    }

    pub fn plan(&self, goals: &[Task]) -> Result<Plan<CraftState>, PlanError> {
        Planner::new(&self.domain)
            .with_max_depth(self.config.max_depth)
            .with_max_expansions(self.config.max_expansions)
            .run_planner(&self.initial_state, goals)
    }

    pub fn solve(&self) -> Result<PlanReport, PlanError> {
        let goals = self.goals();
        info!(
            agent = %self.config.agent_id,
            time_budget = self.config.time_budget,
            goals = goals.len(),
            "solving crafting problem"
        );
        let plan = self.plan(&goals)?;
        let agent = &self.config.agent_id;
        Ok(PlanReport {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            agent_id: agent.clone(),
            goals,
            final_resources: plan.final_state.holdings(agent),
            time_remaining: plan.final_state.time_left(agent),
            steps: plan.steps,
            stats: plan.stats,
        })
    }

    pub fn replay(&self, steps: &[Task]) -> Result<CraftState, PlanError> {
        self.domain.replay(&self.initial_state, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plank_book() -> RecipeBook {
        RecipeBook::from_json_str(
            r#"{
                "Items": ["wood"],
                "Recipes": {"plank": {"Consumes": {"wood": 1}, "Produces": {"plank": 1}, "Time": 5}},
                "Initial": {"wood": 1},
                "Goal": {"plank": 1}
            }"#,
        )
        .expect("valid book")
    }

    #[test]
    fn compiled_domain_registers_every_piece() {
        let domain = compile_domain(&plank_book(), "agent");
        assert_eq!(domain.operator_names(), vec!["op_plank"]);
        let tasks = domain
            .method_table()
            .into_iter()
            .map(|(task, _)| task)
            .collect::<Vec<_>>();
        assert_eq!(tasks, vec!["have_enough", "produce", "produce_plank"]);
        assert_eq!(domain.check_count(), 1);
    }

    #[test]
    fn solve_reports_plan_and_final_state() {
        let problem = CraftingProblem::from_book(
            &plank_book(),
            PlannerConfig::default().with_time_budget(10),
        );
        let report = problem.solve().expect("plan");
        assert_eq!(report.step_names(), vec!["op_plank"]);
        assert_eq!(report.final_resources.get("plank"), Some(&1));
        assert_eq!(report.final_resources.get("wood"), None);
        assert_eq!(report.time_remaining, 5);
        assert_eq!(report.goals, vec![Task::have_enough("agent", "plank", 1)]);

        let replayed = problem.replay(&report.steps).expect("replay");
        assert!(replayed.satisfies(&problem.goal_counts, "agent"));
    }

    #[test]
    fn initial_count_override_can_satisfy_goal_up_front() {
        let problem = CraftingProblem::from_book(&plank_book(), PlannerConfig::default())
            .with_initial_count("plank", 1);
        let report = problem.solve().expect("already satisfied");
        assert!(report.steps.is_empty());
    }

    #[test]
    fn problem_uses_configured_agent() {
        let problem = CraftingProblem::from_book(
            &plank_book(),
            PlannerConfig::default()
                .with_agent_id("steve")
                .with_time_budget(5),
        );
        assert_eq!(problem.initial_state.count("wood", "steve"), 1);
        let report = problem.solve().expect("plan");
        assert_eq!(report.steps, vec![Task::new("op_plank", "steve")]);
    }
}
