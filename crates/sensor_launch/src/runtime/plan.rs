//! Dry-run launch plan

use crate::config::{LaunchDescription, LaunchRequest};
use crate::runtime::walker::{walk, WalkError, WalkSummary};
use indexmap::IndexMap;
use serde::Serialize;

/// Launch plan for dry-run mode
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
    /// Arguments resolved during the walk, in first-use order
    pub args: IndexMap<String, String>,
    /// Requests in emission order
    pub requests: Vec<LaunchRequest>,
    #[serde(skip)]
    pub summary: WalkSummary,
}

impl LaunchPlan {
    /// Walk `description` with a fresh context, recording instead of spawning
    pub fn build(description: &LaunchDescription) -> Result<Self, WalkError> {
        let mut ctx = description.context();
        let mut requests: Vec<LaunchRequest> = Vec::new();
        let summary = walk(description, &mut ctx, &mut requests)?;

        Ok(Self {
            args: ctx.resolved().clone(),
            requests,
            summary,
        })
    }
}

/// Display the launch plan in a human-readable format
impl std::fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Launch Plan")?;
        writeln!(f, "===========")?;
        writeln!(f)?;

        if !self.args.is_empty() {
            writeln!(f, "Arguments:")?;
            for (key, value) in &self.args {
                writeln!(f, "  {}: {}", key, value)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Processes (in launch order):")?;
        for (i, request) in self.requests.iter().enumerate() {
            writeln!(f)?;
            writeln!(
                f,
                "  {}. {} {}",
                i + 1,
                request.label(),
                request
                    .package
                    .as_ref()
                    .map(|p| format!("[{}]", p))
                    .unwrap_or_default()
            )?;
            writeln!(f, "     Command: {} {}", request.executable, request.args.join(" "))?;
            writeln!(f, "     Output: {}", request.output)?;

            if !request.parameters.is_empty() {
                writeln!(f, "     Parameters:")?;
                for (key, value) in &request.parameters {
                    writeln!(f, "       {}:={}", key, value)?;
                }
            }
        }

        if self.summary.groups_pruned > 0 {
            writeln!(f)?;
            writeln!(f, "Skipped groups: {}", self.summary.groups_pruned)?;
        }

        Ok(())
    }
}
