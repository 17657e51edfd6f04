//! Command-line interface for sensor_launch

use crate::config::{ArgumentRegistry, OverridePolicy};
use argh::FromArgs;
use std::path::PathBuf;

/// Evaluate a launch description and start its processes
#[derive(FromArgs, Debug)]
pub struct LaunchArgs {
    /// built-in description name (e.g. icm_20948) or path to a launch YAML file
    #[argh(positional)]
    pub descriptor: String,

    /// argument overrides (format: name:=value or name=value)
    #[argh(positional, from_str_fn(parse_arg_override))]
    pub overrides: Vec<(String, String)>,

    /// what to do with overrides for undeclared arguments: reject or ignore (default: reject)
    #[argh(option, default = "OverridePolicy::Reject")]
    pub unknown_args: OverridePolicy,

    /// show launch plan without executing
    #[argh(switch)]
    pub dry_run: bool,

    /// print the launch plan as JSON (implies --dry-run)
    #[argh(switch)]
    pub json: bool,

    /// list declared arguments and exit
    #[argh(switch)]
    pub show_args: bool,

    /// extra install prefix searched before AMENT_PREFIX_PATH (repeatable)
    #[argh(option)]
    pub prefix_path: Vec<PathBuf>,

    /// seconds to wait for each process to exit on shutdown (default: 5)
    #[argh(option, default = "5")]
    pub shutdown_timeout: u64,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

/// Parse argument override in format "key:=value" or "key=value"
fn parse_arg_override(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(":=")
        .or_else(|| s.split_once('='))
        .ok_or_else(|| format!("Invalid argument format '{}'. Expected 'name:=value'", s))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Invalid argument format '{}'. Missing name", s));
    }
    Ok((name.to_string(), value.to_string()))
}

impl LaunchArgs {
    /// Whether `descriptor` names a launch file rather than a built-in
    pub fn is_launch_file(&self) -> bool {
        let path = std::path::Path::new(&self.descriptor);
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        ) || path.is_file()
    }

    /// Whether to print the plan instead of spawning processes
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || self.json
    }

    /// Level filter for env_logger; unknown names fall back to info
    pub fn log_filter(&self) -> &'static str {
        match self.log_level.to_lowercase().as_str() {
            "error" => "error",
            "warn" => "warn",
            "debug" => "debug",
            "trace" => "trace",
            _ => "info",
        }
    }
}

/// `--show-args` listing: name, description, and unresolved default
pub fn format_arguments(registry: &ArgumentRegistry) -> String {
    if registry.is_empty() {
        return "No arguments.\n".to_string();
    }

    let mut out = String::from("Arguments (pass arguments as '<name>:=<value>'):\n");
    for argument in registry.iter() {
        out.push_str(&format!("\n    '{}':\n", argument.name));
        let description = if argument.description.is_empty() {
            "no description given"
        } else {
            argument.description.as_str()
        };
        out.push_str(&format!("        {}\n", description));
        out.push_str(&format!("        (default: '{}')\n", argument.default));
    }
    out
}
