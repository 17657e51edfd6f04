//! Action tree: process leaves and conditional groups

use crate::config::{Condition, Substitution};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where a launched process sends its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Forward output to the console
    Screen,
    /// Keep output in the log only
    #[default]
    Log,
    /// Console and log
    Both,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            OutputMode::Screen => "screen",
            OutputMode::Log => "log",
            OutputMode::Both => "both",
        };
        write!(f, "{}", mode)
    }
}

/// A unit of launch intent
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Process(ProcessAction),
    Group(GroupAction),
}

impl From<ProcessAction> for Action {
    fn from(action: ProcessAction) -> Self {
        Action::Process(action)
    }
}

impl From<GroupAction> for Action {
    fn from(action: GroupAction) -> Self {
        Action::Group(action)
    }
}

/// Request to start one executable
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessAction {
    /// Package the executable is installed under
    pub package: Option<String>,
    /// Executable name or path
    pub executable: Substitution,
    /// Optional node name, used for logging
    pub name: Option<String>,
    /// Command line arguments
    pub args: Vec<Substitution>,
    /// Named parameters, in declaration order
    pub parameters: IndexMap<String, Substitution>,
    pub output: OutputMode,
}

impl ProcessAction {
    pub fn new(executable: impl Into<Substitution>) -> Self {
        Self {
            package: None,
            executable: executable.into(),
            name: None,
            args: Vec::new(),
            parameters: IndexMap::new(),
            output: OutputMode::default(),
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<Substitution>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Substitution>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Label used in logs and diagnostics
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.executable.to_string())
    }
}

/// Children gated by an optional condition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupAction {
    /// Absent means always included
    pub condition: Option<Condition>,
    pub children: Vec<Action>,
}

impl GroupAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, action: impl Into<Action>) -> Self {
        self.children.push(action.into());
        self
    }
}

/// Fully resolved process request handed to a supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub package: Option<String>,
    pub name: Option<String>,
    pub executable: String,
    pub args: Vec<String>,
    pub parameters: IndexMap<String, String>,
    pub output: OutputMode,
}

impl LaunchRequest {
    /// Label used in logs: node name, else executable
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.executable)
    }
}
