//! Substitution expressions and the `$(arg ...)` pattern parser

use crate::config::{LaunchContext, LocatorError, PackageLocator};
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching substitution patterns: $(type value) or $(type)
static SUBSTITUTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(([\w-]+)(?:\s+([^()]*?))?\s*\)").unwrap());

/// A deferred, context-dependent string expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// Constant text
    Literal(String),
    /// Value of a declared launch argument
    ArgumentRef(String),
    /// Concatenation of parts, in order, with no separator
    Join(Vec<Substitution>),
}

impl Substitution {
    pub fn literal(text: impl Into<String>) -> Self {
        Substitution::Literal(text.into())
    }

    pub fn arg(name: impl Into<String>) -> Self {
        Substitution::ArgumentRef(name.into())
    }

    pub fn join(parts: impl IntoIterator<Item = Substitution>) -> Self {
        Substitution::Join(parts.into_iter().collect())
    }

    /// Resolve to a string against `ctx`.
    ///
    /// Argument references are memoized in the context, so every reference to
    /// the same argument within one context sees the same value.
    pub fn resolve(&self, ctx: &mut LaunchContext<'_>) -> Result<String, SubstitutionError> {
        match self {
            Substitution::Literal(text) => Ok(text.clone()),
            Substitution::ArgumentRef(name) => ctx.resolve_argument(name),
            Substitution::Join(parts) => {
                let mut resolved = String::new();
                for part in parts {
                    resolved.push_str(&part.resolve(ctx)?);
                }
                Ok(resolved)
            }
        }
    }

    /// Parse a launch-file string such as `/$(arg imu_topic)/orientation`.
    ///
    /// `$(arg NAME)` and `$(var NAME)` become argument references.
    /// `$(find-pkg-share PKG)` is looked up immediately and becomes a literal.
    pub fn parse(input: &str, locator: &dyn PackageLocator) -> Result<Self, SubstitutionError> {
        let mut parts = Vec::new();
        let mut last = 0;

        for caps in SUBSTITUTION_PATTERN.captures_iter(input) {
            let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_literal(&mut parts, &input[last..whole.start()])?;

            let value = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            let part = parse_typed(kind.as_str(), value, whole.as_str(), locator)?;
            push_part(&mut parts, part);
            last = whole.end();
        }
        push_literal(&mut parts, &input[last..])?;

        Ok(match parts.len() {
            0 => Substitution::Literal(String::new()),
            1 => parts.remove(0),
            _ => Substitution::Join(parts),
        })
    }
}

fn parse_typed(
    kind: &str,
    value: &str,
    pattern: &str,
    locator: &dyn PackageLocator,
) -> Result<Substitution, SubstitutionError> {
    match kind {
        "arg" | "var" => {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(SubstitutionError::InvalidPattern(pattern.to_string()));
            }
            Ok(Substitution::ArgumentRef(value.to_string()))
        }
        "find-pkg-share" => {
            let share = locator.share_directory(value)?;
            Ok(Substitution::Literal(share.to_string_lossy().into_owned()))
        }
        _ => Err(SubstitutionError::UnknownType(kind.to_string())),
    }
}

fn push_literal(parts: &mut Vec<Substitution>, text: &str) -> Result<(), SubstitutionError> {
    if text.contains("$(") {
        return Err(SubstitutionError::InvalidPattern(text.to_string()));
    }
    if !text.is_empty() {
        push_part(parts, Substitution::Literal(text.to_string()));
    }
    Ok(())
}

/// Push a part, folding adjacent literals together
fn push_part(parts: &mut Vec<Substitution>, part: Substitution) {
    if let (Some(Substitution::Literal(prev)), Substitution::Literal(next)) =
        (parts.last_mut(), &part)
    {
        prev.push_str(next);
        return;
    }
    parts.push(part);
}

impl From<&str> for Substitution {
    fn from(text: &str) -> Self {
        Substitution::Literal(text.to_string())
    }
}

impl From<String> for Substitution {
    fn from(text: String) -> Self {
        Substitution::Literal(text)
    }
}

/// Renders in launch-file syntax, e.g. `/$(arg imu_topic)`
impl std::fmt::Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Substitution::Literal(text) => write!(f, "{}", text),
            Substitution::ArgumentRef(name) => write!(f, "$(arg {})", name),
            Substitution::Join(parts) => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
        }
    }
}

/// Errors that can occur while parsing or resolving a substitution
#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    #[error("Unresolved argument: '{0}' is not declared")]
    UnresolvedArgument(String),

    #[error("Cyclic substitution for argument '{name}': {}", .chain.join(" -> "))]
    CyclicSubstitution { name: String, chain: Vec<String> },

    #[error("Unknown substitution type: {0}")]
    UnknownType(String),

    #[error("Invalid substitution pattern: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    Locator(#[from] LocatorError),
}

impl SubstitutionError {
    /// Argument implicated by this error, if any
    pub fn argument(&self) -> Option<&str> {
        match self {
            SubstitutionError::UnresolvedArgument(name)
            | SubstitutionError::CyclicSubstitution { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArgumentRegistry, StaticLocator};

    fn imu_registry() -> ArgumentRegistry {
        let mut registry = ArgumentRegistry::new();
        registry.declare("imu_topic", "imu", "IMU topic name").unwrap();
        registry
    }

    #[test]
    fn test_join_with_argument() {
        let registry = imu_registry();
        let mut ctx = LaunchContext::new(&registry);

        let topic = Substitution::join([Substitution::literal("/"), Substitution::arg("imu_topic")]);
        assert_eq!(topic.resolve(&mut ctx).unwrap(), "/imu");

        let plot = Substitution::join([topic, "/linear_acceleration/x:y:z".into()]);
        assert_eq!(
            plot.resolve(&mut ctx).unwrap(),
            "/imu/linear_acceleration/x:y:z"
        );
    }

    #[test]
    fn test_join_has_no_implicit_separator() {
        let registry = ArgumentRegistry::new();
        let mut ctx = LaunchContext::new(&registry);
        let joined = Substitution::join(["a".into(), "".into(), "b".into()]);
        assert_eq!(joined.resolve(&mut ctx).unwrap(), "ab");
    }

    #[test]
    fn test_undeclared_reference() {
        let registry = ArgumentRegistry::new();
        let mut ctx = LaunchContext::new(&registry);
        let err = Substitution::arg("frame_id").resolve(&mut ctx).unwrap_err();
        assert!(matches!(err, SubstitutionError::UnresolvedArgument(ref n) if n == "frame_id"));
        assert_eq!(err.argument(), Some("frame_id"));
    }

    #[test]
    fn test_parse_plain_text() {
        let locator = StaticLocator::new();
        let parsed = Substitution::parse("plain string", &locator).unwrap();
        assert_eq!(parsed, Substitution::literal("plain string"));
    }

    #[test]
    fn test_parse_mixed() {
        let locator = StaticLocator::new();
        let parsed = Substitution::parse("/$(arg imu_topic)/orientation/x:y:z:w", &locator).unwrap();
        assert_eq!(
            parsed,
            Substitution::join([
                "/".into(),
                Substitution::arg("imu_topic"),
                "/orientation/x:y:z:w".into(),
            ])
        );
        assert_eq!(parsed.to_string(), "/$(arg imu_topic)/orientation/x:y:z:w");
    }

    #[test]
    fn test_parse_var_alias() {
        let locator = StaticLocator::new();
        let parsed = Substitution::parse("$(var debug)", &locator).unwrap();
        assert_eq!(parsed, Substitution::arg("debug"));
    }

    #[test]
    fn test_parse_find_pkg_share_folds_into_literal() {
        let locator = StaticLocator::new().with_package("icm_20948", "/opt/ros/humble");
        let parsed =
            Substitution::parse("$(find-pkg-share icm_20948)/rviz2/imu.rviz", &locator).unwrap();
        assert_eq!(
            parsed,
            Substitution::literal("/opt/ros/humble/share/icm_20948/rviz2/imu.rviz")
        );
    }

    #[test]
    fn test_parse_missing_package() {
        let locator = StaticLocator::new();
        let result = Substitution::parse("$(find-pkg-share nope)", &locator);
        assert!(matches!(result, Err(SubstitutionError::Locator(_))));
    }

    #[test]
    fn test_parse_unknown_type() {
        let locator = StaticLocator::new();
        let result = Substitution::parse("$(env HOME)", &locator);
        assert!(matches!(result, Err(SubstitutionError::UnknownType(ref t)) if t == "env"));
    }

    #[test]
    fn test_parse_unbalanced() {
        let locator = StaticLocator::new();
        let result = Substitution::parse("/$(arg imu_topic", &locator);
        assert!(matches!(result, Err(SubstitutionError::InvalidPattern(_))));
    }
}
