//! Depth-first walk of the action tree, emitting launch requests

use crate::config::{
    Action, ConditionError, GroupAction, LaunchContext, LaunchDescription, LaunchRequest,
    ProcessAction, Substitution, SubstitutionError,
};
use indexmap::IndexMap;

/// Receives resolved launch requests.
///
/// Submission is fire-and-forget: the walker never waits on the process and
/// cannot observe whether it actually started.
pub trait ProcessSupervisor {
    fn submit(&mut self, request: LaunchRequest);
}

/// Collects requests in emission order
impl ProcessSupervisor for Vec<LaunchRequest> {
    fn submit(&mut self, request: LaunchRequest) {
        self.push(request);
    }
}

/// What a walk did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Requests handed to the supervisor
    pub emitted: usize,
    /// Groups whose condition was open (or absent)
    pub groups_entered: usize,
    /// Groups skipped because their condition was false
    pub groups_pruned: usize,
}

/// Walk `description` with a fresh context
pub fn launch(
    description: &LaunchDescription,
    supervisor: &mut dyn ProcessSupervisor,
) -> Result<WalkSummary, WalkError> {
    let mut ctx = description.context();
    walk(description, &mut ctx, supervisor)
}

/// Walk the top-level actions in order, resolving against `ctx`.
///
/// The first failure aborts the walk. Requests submitted before it stay
/// submitted.
pub fn walk(
    description: &LaunchDescription,
    ctx: &mut LaunchContext<'_>,
    supervisor: &mut dyn ProcessSupervisor,
) -> Result<WalkSummary, WalkError> {
    let mut walker = Walker {
        ctx,
        supervisor,
        summary: WalkSummary::default(),
    };
    walker.visit(description.actions(), "actions")?;

    let summary = walker.summary;
    let stats = walker.ctx.stats();
    log::debug!(
        "Walk finished: {} emitted, {} groups entered, {} pruned, {} arguments evaluated, {} cache hits",
        summary.emitted,
        summary.groups_entered,
        summary.groups_pruned,
        stats.evaluations,
        stats.cache_hits
    );
    Ok(summary)
}

struct Walker<'w, 'a> {
    ctx: &'w mut LaunchContext<'a>,
    supervisor: &'w mut dyn ProcessSupervisor,
    summary: WalkSummary,
}

impl Walker<'_, '_> {
    fn visit(&mut self, actions: &[Action], path: &str) -> Result<(), WalkError> {
        for (i, action) in actions.iter().enumerate() {
            let location = format!("{}/{}", path, i);
            match action {
                Action::Group(group) => self.visit_group(group, &location)?,
                Action::Process(process) => self.visit_process(process, &location)?,
            }
        }
        Ok(())
    }

    fn visit_group(&mut self, group: &GroupAction, location: &str) -> Result<(), WalkError> {
        if let Some(condition) = &group.condition {
            let open = condition
                .evaluate(self.ctx)
                .map_err(|e| WalkError::ConditionFailed {
                    location: location.to_string(),
                    source: e,
                })?;

            if !open {
                log::debug!(
                    "Skipping group at {} ({} is closed, {} children pruned)",
                    location,
                    condition,
                    group.children.len()
                );
                self.summary.groups_pruned += 1;
                return Ok(());
            }
        }

        log::debug!("Entering group at {}", location);
        self.summary.groups_entered += 1;
        self.visit(&group.children, location)
    }

    fn visit_process(&mut self, process: &ProcessAction, location: &str) -> Result<(), WalkError> {
        let label = process.label();
        let executable = self.resolve(&process.executable, || {
            format!("process '{}' at {} executable", label, location)
        })?;

        let mut args = Vec::with_capacity(process.args.len());
        for (i, arg) in process.args.iter().enumerate() {
            args.push(self.resolve(arg, || {
                format!("process '{}' at {} argument {}", label, location, i)
            })?);
        }

        let mut parameters = IndexMap::with_capacity(process.parameters.len());
        for (key, value) in &process.parameters {
            let resolved = self.resolve(value, || {
                format!("process '{}' at {} parameter '{}'", label, location, key)
            })?;
            parameters.insert(key.clone(), resolved);
        }

        let request = LaunchRequest {
            package: process.package.clone(),
            name: process.name.clone(),
            executable,
            args,
            parameters,
            output: process.output,
        };

        log::debug!(
            "Emitting '{}' from {}: {} {}",
            request.label(),
            location,
            request.executable,
            request.args.join(" ")
        );
        self.supervisor.submit(request);
        self.summary.emitted += 1;
        Ok(())
    }

    fn resolve(
        &mut self,
        substitution: &Substitution,
        context: impl FnOnce() -> String,
    ) -> Result<String, WalkError> {
        substitution
            .resolve(self.ctx)
            .map_err(|e| WalkError::SubstitutionFailed {
                context: context(),
                source: e,
            })
    }
}

/// Errors that abort a walk
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("Substitution failed in {context}: {source}")]
    SubstitutionFailed {
        context: String,
        #[source]
        source: SubstitutionError,
    },

    #[error("Condition failed for group at {location}: {source}")]
    ConditionFailed {
        location: String,
        #[source]
        source: ConditionError,
    },
}

impl WalkError {
    /// Argument implicated by this error, if any
    pub fn argument(&self) -> Option<&str> {
        match self {
            WalkError::SubstitutionFailed { source, .. }
            | WalkError::ConditionFailed {
                source: ConditionError::Substitution(source),
                ..
            } => source.argument(),
            WalkError::ConditionFailed { .. } => None,
        }
    }
}
