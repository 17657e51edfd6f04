//! Launch file YAML schema definitions

use crate::config::{
    Action, ArgumentError, Condition, GroupAction, LaunchDescription, OutputMode, PackageLocator,
    ProcessAction, Substitution, SubstitutionError,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root launch file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchFile {
    /// Launch file format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Argument definitions with defaults (ordered as written)
    #[serde(default)]
    pub args: IndexMap<String, ArgDefinition>,

    /// Top-level actions in launch order
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Argument definition with default value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgDefinition {
    /// Default value for the argument, may contain substitutions
    pub default: ArgValue,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Scalar values can be strings, booleans, or numbers.
///
/// Unquoted numbers go through YAML's number parsing and are rendered back from
/// the parsed value, so `0x10` becomes `16` and `0.000001` becomes `1e-6`.
/// Quote a value when its exact text has to reach the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            // Debug keeps the decimal point on whole numbers (1.0, not 1)
            ArgValue::Float(x) => write!(f, "{:?}", x),
            ArgValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// One entry of an `actions` list: exactly one of `node` or `group`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupConfig>,
}

/// Process node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Package the executable is installed under
    #[serde(default)]
    pub package: Option<String>,

    /// Executable name or path
    pub executable: String,

    /// Node name, used for logging
    #[serde(default)]
    pub name: Option<String>,

    /// Command line arguments
    #[serde(default)]
    pub arguments: Vec<ArgValue>,

    /// Named parameters
    #[serde(default)]
    pub parameters: IndexMap<String, ArgValue>,

    #[serde(default)]
    pub output: OutputMode,
}

/// Conditional group configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Include the group when this resolves to "true"
    #[serde(default, rename = "if")]
    pub when: Option<ArgValue>,

    /// Include the group when this resolves to "false"
    #[serde(default)]
    pub unless: Option<ArgValue>,

    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

impl LaunchFile {
    /// Load launch file from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LaunchFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LaunchFileError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse launch file from YAML string
    pub fn from_yaml(content: &str) -> Result<Self, LaunchFileError> {
        let launch_file: LaunchFile =
            serde_yaml::from_str(content).map_err(LaunchFileError::Parse)?;
        launch_file.validate()?;
        Ok(launch_file)
    }

    /// Validate the structure of every action entry
    pub fn validate(&self) -> Result<(), LaunchFileError> {
        validate_actions(&self.actions, "actions")
    }

    /// Build a launch description.
    ///
    /// `$(find-pkg-share ...)` patterns are looked up through `locator` here;
    /// argument references stay deferred until a walk resolves them.
    pub fn to_description(
        &self,
        locator: &dyn PackageLocator,
    ) -> Result<LaunchDescription, LaunchFileError> {
        let mut description = LaunchDescription::new();

        for (name, def) in &self.args {
            let default = parse(&def.default, locator, || format!("args.{}.default", name))?;
            description.declare(
                name.clone(),
                default,
                def.description.clone().unwrap_or_default(),
            )?;
        }

        for (i, action) in self.actions.iter().enumerate() {
            let action = build_action(action, locator, &format!("actions[{}]", i))?;
            description.add_action(action);
        }

        Ok(description)
    }
}

fn validate_actions(actions: &[ActionConfig], path: &str) -> Result<(), LaunchFileError> {
    for (i, action) in actions.iter().enumerate() {
        let path = format!("{}[{}]", path, i);
        match (&action.node, &action.group) {
            (Some(node), None) => {
                if node.executable.trim().is_empty() {
                    return Err(LaunchFileError::Validation(format!(
                        "{}: 'executable' must not be empty",
                        path
                    )));
                }
            }
            (None, Some(group)) => {
                if group.when.is_some() && group.unless.is_some() {
                    return Err(LaunchFileError::Validation(format!(
                        "{}: cannot specify both 'if' and 'unless'",
                        path
                    )));
                }
                validate_actions(&group.actions, &format!("{}.group.actions", path))?;
            }
            (Some(_), Some(_)) => {
                return Err(LaunchFileError::Validation(format!(
                    "{}: cannot specify both 'node' and 'group'",
                    path
                )));
            }
            (None, None) => {
                return Err(LaunchFileError::Validation(format!(
                    "{}: must specify either 'node' or 'group'",
                    path
                )));
            }
        }
    }
    Ok(())
}

fn build_action(
    action: &ActionConfig,
    locator: &dyn PackageLocator,
    path: &str,
) -> Result<Action, LaunchFileError> {
    if let Some(node) = &action.node {
        return Ok(Action::Process(build_process(node, locator, path)?));
    }

    let Some(group) = &action.group else {
        return Err(LaunchFileError::Validation(format!(
            "{}: must specify either 'node' or 'group'",
            path
        )));
    };

    let condition = match (&group.when, &group.unless) {
        (Some(value), None) => Some(Condition::if_true(parse(value, locator, || {
            format!("{}.group.if", path)
        })?)),
        (None, Some(value)) => Some(Condition::unless(parse(value, locator, || {
            format!("{}.group.unless", path)
        })?)),
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err(LaunchFileError::Validation(format!(
                "{}: cannot specify both 'if' and 'unless'",
                path
            )));
        }
    };

    let mut children = Vec::with_capacity(group.actions.len());
    for (i, child) in group.actions.iter().enumerate() {
        children.push(build_action(
            child,
            locator,
            &format!("{}.group.actions[{}]", path, i),
        )?);
    }

    Ok(Action::Group(GroupAction {
        condition,
        children,
    }))
}

fn build_process(
    node: &NodeConfig,
    locator: &dyn PackageLocator,
    path: &str,
) -> Result<ProcessAction, LaunchFileError> {
    let executable = Substitution::parse(&node.executable, locator).map_err(|e| {
        LaunchFileError::Substitution {
            context: format!("{}.node.executable", path),
            source: e,
        }
    })?;

    let mut process = ProcessAction::new(executable).output(node.output);
    process.package = node.package.clone();
    process.name = node.name.clone();

    for (i, arg) in node.arguments.iter().enumerate() {
        let arg = parse(arg, locator, || format!("{}.node.arguments[{}]", path, i))?;
        process = process.arg(arg);
    }

    for (key, value) in &node.parameters {
        let value = parse(value, locator, || format!("{}.node.parameters.{}", path, key))?;
        process = process.parameter(key.clone(), value);
    }

    Ok(process)
}

fn parse(
    value: &ArgValue,
    locator: &dyn PackageLocator,
    context: impl FnOnce() -> String,
) -> Result<Substitution, LaunchFileError> {
    match value {
        ArgValue::String(s) => {
            Substitution::parse(s, locator).map_err(|e| LaunchFileError::Substitution {
                context: context(),
                source: e,
            })
        }
        other => Ok(Substitution::Literal(other.to_string())),
    }
}

/// Errors that can occur when loading a launch file
#[derive(Debug, thiserror::Error)]
pub enum LaunchFileError {
    #[error("Failed to read launch file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse launch file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid substitution in {context}: {source}")]
    Substitution {
        context: String,
        #[source]
        source: SubstitutionError,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticLocator;

    const IMU_YAML: &str = r#"
version: "1.0"
args:
  port:
    default: /dev/ttyACM0
    description: Port for the IMU
  time_out:
    default: 0.5
  baudrate:
    default: 115200
  debug:
    default: false
  rviz_config:
    default: "$(find-pkg-share icm_20948)/rviz2/imu.rviz"
actions:
  - node:
      package: icm_20948
      executable: imu_node
      output: screen
      parameters:
        port: "$(arg port)"
        baudrate: "$(arg baudrate)"
  - group:
      if: "$(arg debug)"
      actions:
        - node:
            package: rviz2
            executable: rviz2
            arguments: ["-d", "$(arg rviz_config)"]
"#;

    fn locator() -> StaticLocator {
        StaticLocator::new().with_package("icm_20948", "/ws/install")
    }

    #[test]
    fn test_parse_launch_file() {
        let launch_file = LaunchFile::from_yaml(IMU_YAML).unwrap();
        assert_eq!(launch_file.version, "1.0");
        let names: Vec<_> = launch_file.args.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["port", "time_out", "baudrate", "debug", "rviz_config"]);
        assert_eq!(launch_file.actions.len(), 2);
    }

    #[test]
    fn test_scalar_defaults_are_stringified() {
        let description = LaunchFile::from_yaml(IMU_YAML)
            .unwrap()
            .to_description(&locator())
            .unwrap();
        let args = description.arguments();
        assert_eq!(args.get_default("time_out"), Some(&Substitution::literal("0.5")));
        assert_eq!(args.get_default("baudrate"), Some(&Substitution::literal("115200")));
        assert_eq!(args.get_default("debug"), Some(&Substitution::literal("false")));
        assert_eq!(
            args.get_default("rviz_config"),
            Some(&Substitution::literal("/ws/install/share/icm_20948/rviz2/imu.rviz"))
        );
        assert_eq!(args.get("port").unwrap().description, "Port for the IMU");
    }

    #[test]
    fn test_actions_are_built() {
        let description = LaunchFile::from_yaml(IMU_YAML)
            .unwrap()
            .to_description(&locator())
            .unwrap();
        let actions = description.actions();
        assert_eq!(actions.len(), 2);

        let Action::Process(imu) = &actions[0] else {
            panic!("expected process action");
        };
        assert_eq!(imu.package.as_deref(), Some("icm_20948"));
        assert_eq!(imu.output, OutputMode::Screen);
        assert_eq!(imu.parameters["port"], Substitution::arg("port"));

        let Action::Group(group) = &actions[1] else {
            panic!("expected group action");
        };
        assert_eq!(
            group.condition,
            Some(Condition::if_true(Substitution::arg("debug")))
        );
        assert_eq!(group.children.len(), 1);
    }

    #[test]
    fn test_missing_package_fails_at_load() {
        let launch_file = LaunchFile::from_yaml(IMU_YAML).unwrap();
        let err = launch_file.to_description(&StaticLocator::new()).unwrap_err();
        assert!(matches!(
            err,
            LaunchFileError::Substitution { ref context, .. } if context == "args.rviz_config.default"
        ));
    }

    #[test]
    fn test_validation_node_and_group() {
        let yaml = r#"
actions:
  - node:
      executable: a
    group:
      actions: []
"#;
        assert!(matches!(
            LaunchFile::from_yaml(yaml),
            Err(LaunchFileError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_if_and_unless() {
        let yaml = r#"
actions:
  - group:
      if: "true"
      unless: "false"
      actions: []
"#;
        let err = LaunchFile::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("actions[0]"));
    }

    #[test]
    fn test_validation_nested_empty_entry() {
        let yaml = r#"
actions:
  - group:
      actions:
        - {}
"#;
        let err = LaunchFile::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("actions[0].group.actions[0]"));
    }

    #[test]
    fn test_unless_group() {
        let yaml = r#"
args:
  headless:
    default: true
actions:
  - group:
      unless: "$(arg headless)"
      actions:
        - node:
            executable: rviz2
"#;
        let description = LaunchFile::from_yaml(yaml)
            .unwrap()
            .to_description(&StaticLocator::new())
            .unwrap();
        let Action::Group(group) = &description.actions()[0] else {
            panic!("expected group action");
        };
        assert_eq!(
            group.condition,
            Some(Condition::unless(Substitution::arg("headless")))
        );
    }

    #[test]
    fn test_float_keeps_decimal_point() {
        assert_eq!(ArgValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ArgValue::Float(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_quoted_scalars_keep_their_text() {
        let yaml = r#"
args:
  register:
    default: 0x10
  register_text:
    default: "0x10"
  tolerance:
    default: 0.000001
  tolerance_text:
    default: "0.000001"
"#;
        let description = LaunchFile::from_yaml(yaml)
            .unwrap()
            .to_description(&StaticLocator::new())
            .unwrap();
        let args = description.arguments();
        assert_eq!(args.get_default("register"), Some(&Substitution::literal("16")));
        assert_eq!(args.get_default("register_text"), Some(&Substitution::literal("0x10")));
        assert_eq!(args.get_default("tolerance"), Some(&Substitution::literal("1e-6")));
        assert_eq!(
            args.get_default("tolerance_text"),
            Some(&Substitution::literal("0.000001"))
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imu.launch.yaml");
        std::fs::write(&path, IMU_YAML).unwrap();
        let launch_file = LaunchFile::from_file(&path).unwrap();
        assert_eq!(launch_file.args.len(), 5);

        let missing = LaunchFile::from_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(LaunchFileError::Io { .. })));
    }
}
