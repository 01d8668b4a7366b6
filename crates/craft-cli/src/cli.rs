use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use craft_contracts::Quantities;
use craft_core::{compile_domain, load_recipe_book, CraftingProblem, PlanError, PlannerConfig};
use serde_json::json;
use tracing::info;

use crate::scenarios::{scenario, SCENARIOS};

pub const ENV_RECIPES_PATH: &str = "CRAFT_RECIPES_PATH";

#[derive(Debug, Parser)]
#[command(name = "craft", about = "HTN planner for crafting recipe tables")]
pub struct Cli {
    /// Increase log detail (-v progress, -vv search decisions, -vvv every node).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search for a plan that reaches the goal counts
    Plan(PlanArgs),
    /// List the operators and methods compiled from a recipe table
    Describe(DescribeArgs),
}

#[derive(Debug, Args, Clone)]
struct PlanArgs {
    #[arg(long, env = ENV_RECIPES_PATH, default_value = "crafting.json")]
    recipes: PathBuf,
    /// Built-in scenario supplying time budget, initial counts, and goals
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    scenario: Option<u8>,
    /// Goal count as item=qty; repeatable, replaces the scenario or file goals
    #[arg(long = "goal", value_name = "ITEM=QTY", value_parser = parse_quantity)]
    goals: Vec<(String, u64)>,
    /// Starting count as item=qty; repeatable, applied on top of other initial counts
    #[arg(long = "initial", value_name = "ITEM=QTY", value_parser = parse_quantity)]
    initial: Vec<(String, u64)>,
    /// Time budget; defaults to the scenario's, otherwise 0
    #[arg(long)]
    time: Option<u64>,
    #[arg(long)]
    agent: Option<String>,
    /// Stop after this many method expansions and report no plan
    #[arg(long, value_name = "N")]
    max_expansions: Option<u64>,
    /// Print the plan report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args, Clone)]
struct DescribeArgs {
    #[arg(long, env = ENV_RECIPES_PATH, default_value = "crafting.json")]
    recipes: PathBuf,
    #[arg(long)]
    agent: Option<String>,
    #[arg(long)]
    json: bool,
}

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoPlan,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<Outcome> {
        match self.command {
            Command::Plan(args) => run_plan(args),
            Command::Describe(args) => run_describe(args),
        }
    }
}

fn parse_quantity(raw: &str) -> Result<(String, u64), String> {
    let (item, qty) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected item=qty, got: {raw}"))?;
    let item = item.trim();
    if item.is_empty() {
        return Err(format!("missing item name: {raw}"));
    }
    let qty = qty
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid quantity: {raw}"))?;
    Ok((item.to_string(), qty))
}

fn base_config(agent: Option<String>) -> PlannerConfig {
    let config = PlannerConfig::from_env();
    match agent.filter(|agent| !agent.trim().is_empty()) {
        Some(agent) => config.with_agent_id(agent.trim()),
        None => config,
    }
}

fn run_plan(args: PlanArgs) -> anyhow::Result<Outcome> {
    let book = load_recipe_book(&args.recipes)
        .with_context(|| format!("loading recipes from {}", args.recipes.display()))?;

    let selected = match args.scenario {
        Some(id) => Some(scenario(id).ok_or_else(|| anyhow!("unknown scenario: {id}"))?),
        None => None,
    };

    let mut initial: Quantities = selected
        .map(|scenario| scenario.initial_counts())
        .unwrap_or_else(|| book.initial.clone());
    initial.extend(args.initial);

    let goal_counts: Quantities = if !args.goals.is_empty() {
        args.goals.into_iter().collect()
    } else if let Some(scenario) = selected {
        scenario.goal_counts()
    } else {
        book.goal.clone()
    };

    let time_budget = args
        .time
        .or(selected.map(|scenario| scenario.time_budget))
        .unwrap_or(0);

    let mut config = base_config(args.agent).with_time_budget(time_budget);
    if let Some(max_expansions) = args.max_expansions {
        config = config.with_max_expansions(max_expansions);
    }

    info!(
        recipes = %args.recipes.display(),
        scenario = ?args.scenario,
        time_budget,
        goals = goal_counts.len(),
        "planning"
    );
    let problem = CraftingProblem::new(&book, config, &initial, goal_counts);

    match problem.solve() {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(Outcome::Success)
        }
        Err(PlanError::NoPlan { goals, stats }) => {
            if args.json {
                let body = json!({
                    "agent_id": problem.config.agent_id,
                    "goals": problem.goals(),
                    "plan": null,
                    "stats": stats,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("no plan found for {goals} goal(s)");
                println!("{stats}");
            }
            Ok(Outcome::NoPlan)
        }
        Err(err) => Err(err.into()),
    }
}

fn run_describe(args: DescribeArgs) -> anyhow::Result<Outcome> {
    let book = load_recipe_book(&args.recipes)
        .with_context(|| format!("loading recipes from {}", args.recipes.display()))?;
    let config = base_config(args.agent);
    let domain = compile_domain(&book, &config.agent_id);

    if args.json {
        let methods = domain
            .method_table()
            .into_iter()
            .map(|(task, labels)| json!({ "task": task, "methods": labels }))
            .collect::<Vec<_>>();
        let body = json!({
            "agent_id": config.agent_id,
            "operators": domain.operator_names(),
            "methods": methods,
            "scenarios": SCENARIOS.iter().map(|scenario| scenario.id).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(Outcome::Success);
    }

    println!("operators:");
    for name in domain.operator_names() {
        println!("  {name}");
    }
    println!("methods:");
    for (task, labels) in domain.method_table() {
        println!("  {task}: {}", labels.join(", "));
    }
    Ok(Outcome::Success)
}
