//! Crafting domain compiler for hierarchical task network planning.
//!
//! A [`craft_contracts::RecipeBook`] is compiled into the pieces a generic HTN
//! search needs: one operator and one `produce_<item>` method per recipe, the
//! fixed `have_enough`/`produce` acquisition methods, a resource-counted
//! initial [`state::CraftState`], a goal task list, and a pruning heuristic
//! that cuts out-of-time and cyclic branches. [`htn`] holds the
//! depth-first backtracking search those pieces plug into.

pub mod acquire;
pub mod config;
pub mod domain;
pub mod heuristic;
pub mod htn;
pub mod method;
pub mod operator;
pub mod recipes;
pub mod setup;
pub mod state;

pub use config::PlannerConfig;
pub use domain::{compile_domain, CraftingProblem};
pub use heuristic::{PruneReason, PruningHeuristic};
pub use htn::{Domain, Plan, PlanError, Planner};
pub use method::CraftMethod;
pub use operator::{CraftOperator, OperatorFailure};
pub use recipes::{load_recipe_book, validate, RecipeError};
pub use setup::{build_goal_list, build_initial_state};
pub use state::CraftState;
