//! Task types for the generic `execute` entry point.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for unrecognized task names.
#[derive(Debug, Error)]
#[error("unknown task: {0}")]
pub struct UnknownTaskError(pub String);

/// Lifecycle task selected through `execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ExecuteTask {
    /// Act on the development environment of the root application.
    Dev,
    /// Act on the infrastructure.
    Infra,
}

impl FromStr for ExecuteTask {
    type Err = UnknownTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(ExecuteTask::Dev),
            "infra" => Ok(ExecuteTask::Infra),
            other => Err(UnknownTaskError(other.to_string())),
        }
    }
}

/// Options for `execute`.
#[derive(Debug, Clone)]
pub struct ExecuteOpts {
    /// Which target the action runs against.
    pub task: ExecuteTask,
    /// Action name handed to the implementation.
    pub action: String,
    /// Arguments for the action.
    pub args: Vec<String>,
}

impl ExecuteOpts {
    /// Create execute options with no arguments.
    pub fn new(task: ExecuteTask, action: impl Into<String>) -> Self {
        Self {
            task,
            action: action.into(),
            args: Vec::new(),
        }
    }

    /// Attach action arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}
