//! Launch argument declarations and caller overrides

use crate::config::Substitution;
use indexmap::IndexMap;

/// A named, overridable configuration value
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchArgument {
    /// Unique argument name
    pub name: String,
    /// Value used when the caller does not override it
    pub default: Substitution,
    /// Human readable description (shown by `--show-args`)
    pub description: String,
}

impl LaunchArgument {
    /// Create a new argument declaration
    pub fn new(
        name: impl Into<String>,
        default: impl Into<Substitution>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            description: description.into(),
        }
    }
}

/// What to do with an override for a name that was never declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Fail with [`ArgumentError::UnknownArgumentOverride`]
    #[default]
    Reject,
    /// Log a warning and drop the override
    Ignore,
}

impl std::str::FromStr for OverridePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(OverridePolicy::Reject),
            "ignore" => Ok(OverridePolicy::Ignore),
            other => Err(format!(
                "Invalid override policy '{}'. Expected 'reject' or 'ignore'",
                other
            )),
        }
    }
}

/// Declared arguments plus the overrides recorded for this invocation
#[derive(Debug, Clone, Default)]
pub struct ArgumentRegistry {
    arguments: IndexMap<String, LaunchArgument>,
    overrides: IndexMap<String, String>,
    policy: OverridePolicy,
}

impl ArgumentRegistry {
    /// Create an empty registry that rejects unknown overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy applied to overrides of undeclared names
    pub fn with_policy(mut self, policy: OverridePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: OverridePolicy) {
        self.policy = policy;
    }

    /// Declare a new argument
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        default: impl Into<Substitution>,
        description: impl Into<String>,
    ) -> Result<(), ArgumentError> {
        self.declare_argument(LaunchArgument::new(name, default, description))
    }

    /// Declare a prebuilt argument
    pub fn declare_argument(&mut self, argument: LaunchArgument) -> Result<(), ArgumentError> {
        if self.arguments.contains_key(&argument.name) {
            return Err(ArgumentError::DuplicateArgument(argument.name));
        }
        log::trace!("Declared argument '{}'", argument.name);
        self.arguments.insert(argument.name.clone(), argument);
        Ok(())
    }

    /// Record a caller override, taking precedence over the declared default.
    ///
    /// Overrides for undeclared names follow the registry's [`OverridePolicy`].
    /// A later override for the same name replaces the earlier one.
    pub fn set_override(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ArgumentError> {
        let name = name.into();
        if !self.arguments.contains_key(&name) {
            match self.policy {
                OverridePolicy::Reject => {
                    return Err(ArgumentError::UnknownArgumentOverride(name));
                }
                OverridePolicy::Ignore => {
                    log::warn!("Ignoring override for undeclared argument '{}'", name);
                    return Ok(());
                }
            }
        }
        self.overrides.insert(name, value.into());
        Ok(())
    }

    /// Record several overrides in order, stopping at the first rejected one
    pub fn set_overrides<I, K, V>(&mut self, overrides: I) -> Result<(), ArgumentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in overrides {
            self.set_override(name, value)?;
        }
        Ok(())
    }

    /// Declared default for `name`, if declared
    pub fn get_default(&self, name: &str) -> Option<&Substitution> {
        self.arguments.get(name).map(|arg| &arg.default)
    }

    pub fn get(&self, name: &str) -> Option<&LaunchArgument> {
        self.arguments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// Recorded overrides in the order they were given
    pub fn overrides(&self) -> &IndexMap<String, String> {
        &self.overrides
    }

    /// Arguments in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &LaunchArgument> {
        self.arguments.values()
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// Errors raised while declaring or overriding arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("Argument '{0}' is already declared")]
    DuplicateArgument(String),

    #[error("Override given for undeclared argument '{0}'")]
    UnknownArgumentOverride(String),
}
