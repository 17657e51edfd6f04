//! Launch description assembly

use crate::config::{Action, ArgumentError, ArgumentRegistry, LaunchContext, Substitution};

/// Declared arguments plus the ordered top-level actions
#[derive(Debug, Clone, Default)]
pub struct LaunchDescription {
    arguments: ArgumentRegistry,
    actions: Vec<Action>,
}

impl LaunchDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an argument; names must be unique
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        default: impl Into<Substitution>,
        description: impl Into<String>,
    ) -> Result<&mut Self, ArgumentError> {
        self.arguments.declare(name, default, description)?;
        Ok(self)
    }

    /// Append a top-level action after those already added
    pub fn add_action(&mut self, action: impl Into<Action>) -> &mut Self {
        self.actions.push(action.into());
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn arguments(&self) -> &ArgumentRegistry {
        &self.arguments
    }

    /// Mutable access for recording overrides before a run
    pub fn arguments_mut(&mut self) -> &mut ArgumentRegistry {
        &mut self.arguments
    }

    /// Fresh resolution context for one invocation
    pub fn context(&self) -> LaunchContext<'_> {
        LaunchContext::new(&self.arguments)
    }

    /// Total number of process actions in the tree, gated or not
    pub fn process_count(&self) -> usize {
        fn count(actions: &[Action]) -> usize {
            actions
                .iter()
                .map(|action| match action {
                    Action::Process(_) => 1,
                    Action::Group(group) => count(&group.children),
                })
                .sum()
        }
        count(&self.actions)
    }
}
