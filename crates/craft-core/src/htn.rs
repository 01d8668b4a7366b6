//! Generic HTN search: a domain registry of methods, operators, and pruning
//! checks, plus a depth-first backtracking planner over it.
//!
//! The engine knows nothing about crafting. A task is resolved by name: an
//! operator registered under that name is applied to a snapshot of the state,
//! and every method registered under it is tried in registration order. A task
//! that is neither fails its branch. Pruning checks run before every task is
//! expanded and veto the branch exactly as if it had failed.
//!
//! Each pending task carries the chain of compound tasks whose expansion led to
//! it (its call stack). A method's last subtask takes over its parent's chain
//! without the parent: once the last subtask starts, the parent has nothing
//! left to expand. Recursive re-checks in tail position therefore do not trip
//! a cycle guard, while genuine production cycles still do.
//!
//! Open nodes live on an explicit frame stack, so search depth is limited by
//! `max_depth` and never by the thread's stack. `max_expansions` caps the
//! total number of method expansions; running out ends the search as if no
//! plan existed, with `SearchStats::exhausted` set.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use craft_contracts::{SearchStats, Task};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_MAX_DEPTH: usize = 4096;
pub const DEFAULT_MAX_EXPANSIONS: u64 = 250_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Local "not applicable" signal from an operator. Never fatal; the search
/// backtracks on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Infeasible(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no plan found for {goals} goal task(s) ({stats})")]
    NoPlan { goals: usize, stats: SearchStats },

    #[error("unknown operator in plan: {0}")]
    UnknownOperator(String),

    #[error("plan step {index} {task} failed on replay: {reason}")]
    ReplayFailed {
        index: usize,
        task: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Methods, operators, pruning checks
// ---------------------------------------------------------------------------

type DecomposeFn<S> = dyn Fn(&S, &Task) -> Option<Vec<Task>> + Send + Sync;
type ApplyFn<S> = dyn Fn(&mut S, &Task) -> Result<(), Infeasible> + Send + Sync;

/// One decomposition alternative for a compound task. `None` means the method
/// does not apply in this state.
pub struct Method<S> {
    name: String,
    decompose: Box<DecomposeFn<S>>,
}

impl<S> Method<S> {
    pub fn new(
        name: impl Into<String>,
        decompose: impl Fn(&S, &Task) -> Option<Vec<Task>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            decompose: Box::new(decompose),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decompose(&self, state: &S, task: &Task) -> Option<Vec<Task>> {
        (self.decompose)(state, task)
    }
}

impl<S> fmt::Debug for Method<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}

/// A primitive action. The planner hands it a private copy of the state, so an
/// operator may mutate freely before failing.
pub struct Operator<S> {
    name: String,
    apply: Box<ApplyFn<S>>,
}

impl<S> Operator<S> {
    pub fn new(
        name: impl Into<String>,
        apply: impl Fn(&mut S, &Task) -> Result<(), Infeasible> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, state: &mut S, task: &Task) -> Result<(), Infeasible> {
        (self.apply)(state, task)
    }
}

impl<S> fmt::Debug for Operator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct Pending {
    pub task: Task,
    call_stack: Rc<[Task]>,
}

impl Pending {
    pub fn root(task: Task) -> Self {
        Self {
            task,
            call_stack: Rc::from(Vec::new()),
        }
    }

    pub fn call_stack(&self) -> &[Task] {
        &self.call_stack
    }
}

/// Everything a pruning check may look at before a task is expanded.
pub struct PruneContext<'a, S> {
    pub state: &'a S,
    pub task: &'a Task,
    /// Tasks still queued after `task`.
    pub pending: &'a [Pending],
    /// Operators committed so far on this branch.
    pub plan: &'a [Task],
    pub depth: usize,
    pub call_stack: &'a [Task],
}

impl<S> PruneContext<'_, S> {
    pub fn task_in_call_stack(&self) -> bool {
        self.call_stack.contains(self.task)
    }
}

/// Advisory veto consulted before every expansion. Must not depend on hidden
/// mutable state.
pub trait PruningCheck<S>: Send + Sync {
    fn should_prune(&self, ctx: &PruneContext<'_, S>) -> bool;
}

impl<S, F> PruningCheck<S> for F
where
    F: Fn(&PruneContext<'_, S>) -> bool + Send + Sync,
{
    fn should_prune(&self, ctx: &PruneContext<'_, S>) -> bool {
        self(ctx)
    }
}

// ---------------------------------------------------------------------------
// Domain registry
// ---------------------------------------------------------------------------

pub struct Domain<S> {
    operators: BTreeMap<String, Operator<S>>,
    methods: BTreeMap<String, Vec<Method<S>>>,
    checks: Vec<Box<dyn PruningCheck<S>>>,
}

impl<S> Domain<S> {
    pub fn new() -> Self {
        Self {
            operators: BTreeMap::new(),
            methods: BTreeMap::new(),
            checks: Vec::new(),
        }
    }

    /// Register operators by name. A later operator with the same name
    /// replaces the earlier one.
    pub fn declare_operators(&mut self, operators: impl IntoIterator<Item = Operator<S>>) {
        for operator in operators {
            if let Some(previous) = self.operators.insert(operator.name.clone(), operator) {
                warn!(operator = %previous.name, "operator redeclared, keeping the later one");
            }
        }
    }

    pub fn declare_methods(
        &mut self,
        task_name: &str,
        methods: impl IntoIterator<Item = Method<S>>,
    ) {
        self.methods
            .entry(task_name.to_string())
            .or_default()
            .extend(methods);
    }

    pub fn add_pruning_check(&mut self, check: impl PruningCheck<S> + 'static) {
        self.checks.push(Box::new(check));
    }

    pub fn operator(&self, name: &str) -> Option<&Operator<S>> {
        self.operators.get(name)
    }

    /// Alternatives for `task_name` in registration order.
    pub fn methods(&self, task_name: &str) -> &[Method<S>] {
        self.methods
            .get(task_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn operator_names(&self) -> Vec<&str> {
        self.operators.keys().map(String::as_str).collect()
    }

    pub fn method_table(&self) -> Vec<(&str, Vec<&str>)> {
        self.methods
            .iter()
            .map(|(task, methods)| {
                (
                    task.as_str(),
                    methods.iter().map(Method::name).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }
}

impl<S> Default for Domain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Domain<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("operators", &self.operator_names())
            .field("methods", &self.method_table())
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl<S: Clone + fmt::Debug> Domain<S> {
    pub fn run_planner(
        &self,
        state: &S,
        goals: &[Task],
        max_depth: usize,
    ) -> Result<Plan<S>, PlanError> {
        Planner::new(self)
            .with_max_depth(max_depth)
            .run_planner(state, goals)
    }

    pub fn replay(&self, state: &S, steps: &[Task]) -> Result<S, PlanError> {
        let mut current = state.clone();
        for (index, step) in steps.iter().enumerate() {
            let operator = self
                .operator(&step.name)
                .ok_or_else(|| PlanError::UnknownOperator(step.name.clone()))?;
            operator
                .apply(&mut current, step)
                .map_err(|reason| PlanError::ReplayFailed {
                    index,
                    task: step.to_string(),
                    reason: reason.to_string(),
                })?;
        }
        Ok(current)
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Plan<S> {
    pub steps: Vec<Task>,
    pub final_state: S,
    pub stats: SearchStats,
}

#[derive(Debug)]
pub struct Planner<'d, S> {
    domain: &'d Domain<S>,
    max_depth: usize,
    max_expansions: u64,
}

impl<'d, S: Clone + fmt::Debug> Planner<'d, S> {
    pub fn new(domain: &'d Domain<S>) -> Self {
        Self {
            domain,
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: u64) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Search for an operator sequence that accomplishes `goals` left to right.
    pub fn run_planner(&self, state: &S, goals: &[Task]) -> Result<Plan<S>, PlanError> {
        info!(
            goals = goals.len(),
            max_depth = self.max_depth,
            max_expansions = self.max_expansions,
            "planning started"
        );
        let agenda = goals.iter().cloned().map(Pending::root).collect::<Vec<_>>();
        let mut search = Search {
            domain: self.domain,
            max_depth: self.max_depth,
            max_expansions: self.max_expansions,
            stats: SearchStats::default(),
            plan: Vec::new(),
        };

        match search.run(state.clone(), agenda) {
            Some(final_state) => {
                info!(steps = search.plan.len(), stats = %search.stats, "plan found");
                Ok(Plan {
                    steps: search.plan,
                    final_state,
                    stats: search.stats,
                })
            }
            None => {
                info!(stats = %search.stats, "no plan found");
                Err(PlanError::NoPlan {
                    goals: goals.len(),
                    stats: search.stats,
                })
            }
        }
    }
}

/// An open node: the agenda entered at `depth` and the next alternative to
/// try for its head task.
struct Frame<S> {
    state: Rc<S>,
    agenda: Vec<Pending>,
    depth: usize,
    next_alternative: usize,
    plan_len: usize,
}

enum Entry<S> {
    Solved(Rc<S>),
    Open(Frame<S>),
    Closed,
}

struct Search<'d, S> {
    domain: &'d Domain<S>,
    max_depth: usize,
    max_expansions: u64,
    stats: SearchStats,
    plan: Vec<Task>,
}

impl<S: Clone + fmt::Debug> Search<'_, S> {
    fn run(&mut self, state: S, agenda: Vec<Pending>) -> Option<S> {
        let mut frames = Vec::new();
        match self.enter(Rc::new(state), agenda, 0) {
            Entry::Solved(state) => return Some(into_owned(state)),
            Entry::Open(frame) => frames.push(frame),
            Entry::Closed => return None,
        }

        while let Some(frame) = frames.last_mut() {
            let Some((state, agenda)) = self.next_child(frame) else {
                if self.stats.exhausted {
                    return None;
                }
                if let Some(done) = frames.pop() {
                    self.plan.truncate(done.plan_len);
                }
                continue;
            };
            let depth = frame.depth + 1;
            match self.enter(state, agenda, depth) {
                Entry::Solved(state) => return Some(into_owned(state)),
                Entry::Open(child) => frames.push(child),
                Entry::Closed => {}
            }
        }

        None
    }

    /// Depth bound and pruning checks for a freshly produced agenda.
    fn enter(&mut self, state: Rc<S>, agenda: Vec<Pending>, depth: usize) -> Entry<S> {
        let Some(current) = agenda.first() else {
            return Entry::Solved(state);
        };
        self.stats.max_depth = self.stats.max_depth.max(depth);

        if depth >= self.max_depth {
            self.stats.pruned += 1;
            debug!(depth, task = %current.task, "depth limit reached");
            return Entry::Closed;
        }

        let ctx = PruneContext {
            state: &*state,
            task: &current.task,
            pending: &agenda[1..],
            plan: &self.plan,
            depth,
            call_stack: current.call_stack(),
        };
        if self.domain.checks.iter().any(|check| check.should_prune(&ctx)) {
            self.stats.pruned += 1;
            debug!(depth, task = %current.task, "branch pruned");
            return Entry::Closed;
        }

        Entry::Open(Frame {
            state,
            agenda,
            depth,
            next_alternative: 0,
            plan_len: self.plan.len(),
        })
    }

    /// The operator comes first, then methods in registration order.
    fn next_child(&mut self, frame: &mut Frame<S>) -> Option<(Rc<S>, Vec<Pending>)> {
        self.plan.truncate(frame.plan_len);
        let domain = self.domain;
        let (current, rest) = frame.agenda.split_first()?;
        let depth = frame.depth;
        let operator = domain.operator(&current.task.name);
        let methods = domain.methods(&current.task.name);

        loop {
            let alternative = frame.next_alternative;
            frame.next_alternative += 1;

            let index = match operator {
                Some(operator) if alternative == 0 => {
                    self.stats.operator_applications += 1;
                    let mut next = (*frame.state).clone();
                    match operator.apply(&mut next, &current.task) {
                        Ok(()) => {
                            debug!(depth, task = %current.task, "operator applied");
                            trace!(state = ?next, "state after operator");
                            self.plan.push(current.task.clone());
                            return Some((Rc::new(next), rest.to_vec()));
                        }
                        Err(reason) => {
                            self.stats.operator_failures += 1;
                            debug!(depth, task = %current.task, %reason, "operator not applicable");
                            continue;
                        }
                    }
                }
                Some(_) => alternative - 1,
                None => alternative,
            };

            let Some(method) = methods.get(index) else {
                if operator.is_none() && methods.is_empty() {
                    debug!(depth, task = %current.task, "no operator or method for task");
                }
                return None;
            };
            if self.stats.expansions >= self.max_expansions {
                self.stats.exhausted = true;
                info!(expansions = self.stats.expansions, "expansion budget exhausted");
                return None;
            }
            self.stats.expansions += 1;

            let Some(subtasks) = method.decompose(&frame.state, &current.task) else {
                self.stats.method_failures += 1;
                debug!(depth, task = %current.task, method = method.name(), "method not applicable");
                continue;
            };
            debug!(
                depth,
                task = %current.task,
                method = method.name(),
                subtasks = subtasks.len(),
                "method applied"
            );
            return Some((Rc::clone(&frame.state), expand(current, subtasks, rest)));
        }
    }
}

fn into_owned<S: Clone>(state: Rc<S>) -> S {
    Rc::try_unwrap(state).unwrap_or_else(|shared| (*shared).clone())
}

/// Replace `parent` with its subtasks at the front of the agenda.
fn expand(parent: &Pending, subtasks: Vec<Task>, rest: &[Pending]) -> Vec<Pending> {
    let child_stack: Rc<[Task]> = parent
        .call_stack
        .iter()
        .cloned()
        .chain(std::iter::once(parent.task.clone()))
        .collect();
    let last = subtasks.len().saturating_sub(1);

    let mut agenda = Vec::with_capacity(subtasks.len() + rest.len());
    for (idx, task) in subtasks.into_iter().enumerate() {
        let call_stack = if idx == last {
            Rc::clone(&parent.call_stack)
        } else {
            Rc::clone(&child_stack)
        };
        agenda.push(Pending { task, call_stack });
    }
    agenda.extend(rest.iter().cloned());
    agenda
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
