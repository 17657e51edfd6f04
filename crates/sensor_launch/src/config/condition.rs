//! Boolean gates derived from substitutions

use crate::config::{LaunchContext, Substitution, SubstitutionError};

/// A gate guarding inclusion of an action subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Expression whose resolved value must be "true" or "false"
    pub predicate: Substitution,
    /// Invert the gate after validation ("unless" form)
    pub negated: bool,
}

impl Condition {
    /// Gate that is open when the predicate resolves to "true"
    pub fn if_true(predicate: impl Into<Substitution>) -> Self {
        Self {
            predicate: predicate.into(),
            negated: false,
        }
    }

    /// Gate that is open when the predicate resolves to "false"
    pub fn unless(predicate: impl Into<Substitution>) -> Self {
        Self {
            predicate: predicate.into(),
            negated: true,
        }
    }

    /// Resolve the predicate and interpret it as a boolean
    pub fn evaluate(&self, ctx: &mut LaunchContext<'_>) -> Result<bool, ConditionError> {
        let value = self.predicate.resolve(ctx)?;
        let gate = parse_bool(&value).ok_or_else(|| ConditionError::InvalidConditionValue {
            condition: self.to_string(),
            value: value.clone(),
        })?;
        Ok(gate != self.negated)
    }
}

/// Case-insensitive "true"/"false"; anything else is rejected
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "unless {}", self.predicate)
        } else {
            write!(f, "if {}", self.predicate)
        }
    }
}

/// Errors that can occur while evaluating a condition
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("Invalid value '{value}' for condition '{condition}': expected 'true' or 'false'")]
    InvalidConditionValue { condition: String, value: String },

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
}
