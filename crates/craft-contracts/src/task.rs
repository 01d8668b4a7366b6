//! Task tuples exchanged between the compiled domain and the search engine.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const HAVE_ENOUGH: &str = "have_enough";
pub const PRODUCE: &str = "produce";
pub const PRODUCE_PREFIX: &str = "produce_";
pub const OPERATOR_PREFIX: &str = "op_";

/// A positional task argument after the agent id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskArg {
    Count(u64),
    Name(String),
}

impl fmt::Display for TaskArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(value) => write!(f, "{value}"),
            Self::Name(value) => f.write_str(value),
        }
    }
}

/// `(name, agent, args...)`. Equality covers every field, which is what the
/// cycle guard compares against the call stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TaskArg>,
}

impl Task {
    pub fn new(name: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: agent.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: TaskArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn have_enough(agent: impl Into<String>, item: impl Into<String>, qty: u64) -> Self {
        Self::new(HAVE_ENOUGH, agent)
            .with_arg(TaskArg::Name(item.into()))
            .with_arg(TaskArg::Count(qty))
    }

    pub fn produce(agent: impl Into<String>, item: impl Into<String>) -> Self {
        Self::new(PRODUCE, agent).with_arg(TaskArg::Name(item.into()))
    }

    pub fn produce_item(agent: impl Into<String>, item: &str) -> Self {
        Self::new(format!("{PRODUCE_PREFIX}{item}"), agent)
    }

    pub fn name_arg(&self, idx: usize) -> Option<&str> {
        match self.args.get(idx) {
            Some(TaskArg::Name(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn count_arg(&self, idx: usize) -> Option<u64> {
        match self.args.get(idx) {
            Some(TaskArg::Count(value)) => Some(*value),
            _ => None,
        }
    }

    /// True for item-specific production tasks (`produce_<item>`), not for the
    /// `produce` dispatcher itself.
    pub fn is_item_production(&self) -> bool {
        self.name.starts_with(PRODUCE_PREFIX)
    }

    pub fn is_operator(&self) -> bool {
        self.name.starts_with(OPERATOR_PREFIX)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}", self.name, self.agent)?;
        for arg in &self.args {
            write!(f, ", {arg}")?;
        }
        f.write_str(")")
    }
}
