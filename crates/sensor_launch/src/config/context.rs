//! Per-invocation resolution state

use crate::config::{ArgumentRegistry, SubstitutionError};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Counters describing how much work a context has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Argument references answered from the cache
    pub cache_hits: usize,
    /// Arguments whose value was computed (override or default)
    pub evaluations: usize,
}

/// Resolution state for one launch invocation.
///
/// Holds the overrides captured from the registry when the context was
/// created, the memoized value of every argument resolved so far, and the set
/// of arguments currently being resolved (the cycle guard).
#[derive(Debug)]
pub struct LaunchContext<'a> {
    registry: &'a ArgumentRegistry,
    overrides: HashMap<String, String>,
    resolved_cache: IndexMap<String, String>,
    resolving: IndexSet<String>,
    stats: ResolutionStats,
}

impl<'a> LaunchContext<'a> {
    /// Create a fresh context, merging in the overrides recorded on `registry`
    pub fn new(registry: &'a ArgumentRegistry) -> Self {
        let overrides = registry
            .overrides()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            registry,
            overrides,
            resolved_cache: IndexMap::new(),
            resolving: IndexSet::new(),
            stats: ResolutionStats::default(),
        }
    }

    /// Resolve a declared argument, computing it at most once per context
    pub fn resolve_argument(&mut self, name: &str) -> Result<String, SubstitutionError> {
        if let Some(value) = self.resolved_cache.get(name) {
            self.stats.cache_hits += 1;
            log::trace!("Argument '{}' served from cache", name);
            return Ok(value.clone());
        }

        let value = match self.overrides.get(name) {
            Some(value) => value.clone(),
            None => self.resolve_default(name)?,
        };

        self.stats.evaluations += 1;
        log::trace!("Argument '{}' resolved to '{}'", name, value);
        self.resolved_cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn resolve_default(&mut self, name: &str) -> Result<String, SubstitutionError> {
        let registry = self.registry;
        let default = registry
            .get_default(name)
            .ok_or_else(|| SubstitutionError::UnresolvedArgument(name.to_string()))?;

        if self.resolving.contains(name) {
            let mut chain: Vec<String> = self
                .resolving
                .iter()
                .skip_while(|n| n.as_str() != name)
                .cloned()
                .collect();
            chain.push(name.to_string());
            return Err(SubstitutionError::CyclicSubstitution {
                name: name.to_string(),
                chain,
            });
        }

        self.resolving.insert(name.to_string());
        let result = default.resolve(self);
        self.resolving.shift_remove(name);
        result
    }

    /// Memoized value of `name`, if it has been resolved in this context
    pub fn cached(&self, name: &str) -> Option<&str> {
        self.resolved_cache.get(name).map(String::as_str)
    }

    /// Every argument resolved so far, in first-resolution order
    pub fn resolved(&self) -> &IndexMap<String, String> {
        &self.resolved_cache
    }

    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Substitution;

    #[test]
    fn test_default_is_computed_once() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("frame_id", "imu_link", "Frame ID").unwrap();
        let mut ctx = LaunchContext::new(&registry);

        let first = ctx.resolve_argument("frame_id").unwrap();
        let second = ctx.resolve_argument("frame_id").unwrap();
        let third = Substitution::arg("frame_id").resolve(&mut ctx).unwrap();

        assert_eq!(first, "imu_link");
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(
            ctx.stats(),
            ResolutionStats {
                cache_hits: 2,
                evaluations: 1
            }
        );
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("port", "/dev/ttyACM0", "Port").unwrap();
        registry.set_override("port", "/dev/ttyUSB0").unwrap();

        let mut ctx = LaunchContext::new(&registry);
        assert_eq!(ctx.resolve_argument("port").unwrap(), "/dev/ttyUSB0");
        assert_eq!(ctx.cached("port"), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_override_skips_broken_default() {
        let mut registry = ArgumentRegistry::new();
        registry
            .declare("x", Substitution::arg("missing"), "broken default")
            .unwrap();
        registry.set_override("x", "fine").unwrap();

        let mut ctx = LaunchContext::new(&registry);
        assert_eq!(ctx.resolve_argument("x").unwrap(), "fine");
    }

    #[test]
    fn test_default_referencing_other_argument() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("imu_topic", "imu", "Topic").unwrap();
        registry
            .declare(
                "accel_topic",
                Substitution::join([Substitution::arg("imu_topic"), "/accel".into()]),
                "Derived topic",
            )
            .unwrap();
        registry.set_override("imu_topic", "imu_front").unwrap();

        let mut ctx = LaunchContext::new(&registry);
        assert_eq!(ctx.resolve_argument("accel_topic").unwrap(), "imu_front/accel");
        let order: Vec<_> = ctx.resolved().keys().map(String::as_str).collect();
        assert_eq!(order, vec!["imu_topic", "accel_topic"]);
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("x", Substitution::arg("x"), "loops").unwrap();
        let mut ctx = LaunchContext::new(&registry);

        let err = ctx.resolve_argument("x").unwrap_err();
        match err {
            SubstitutionError::CyclicSubstitution { name, chain } => {
                assert_eq!(name, "x");
                assert_eq!(chain, vec!["x", "x"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ctx.cached("x").is_none());
    }

    #[test]
    fn test_indirect_cycle_reports_chain() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("top", Substitution::arg("a"), "").unwrap();
        registry.declare("a", Substitution::arg("b"), "").unwrap();
        registry.declare("b", Substitution::arg("a"), "").unwrap();
        let mut ctx = LaunchContext::new(&registry);

        let err = ctx.resolve_argument("top").unwrap_err();
        match err {
            SubstitutionError::CyclicSubstitution { name, chain } => {
                assert_eq!(name, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_guard_is_released_after_failure() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("a", Substitution::arg("missing"), "").unwrap();
        let mut ctx = LaunchContext::new(&registry);

        // Both attempts must report the missing name, not a cycle on 'a'
        for _ in 0..2 {
            let err = ctx.resolve_argument("a").unwrap_err();
            assert!(matches!(err, SubstitutionError::UnresolvedArgument(ref n) if n == "missing"));
        }
    }

    #[test]
    fn test_contexts_do_not_share_cache() {
        let mut registry = ArgumentRegistry::new();
        registry.declare("port", "/dev/ttyACM0", "Port").unwrap();

        let mut first = LaunchContext::new(&registry);
        first.resolve_argument("port").unwrap();

        let second = LaunchContext::new(&registry);
        assert!(second.cached("port").is_none());
        assert_eq!(second.stats(), ResolutionStats::default());
    }
}
