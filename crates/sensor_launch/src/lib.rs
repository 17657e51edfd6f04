//! Sensor Launch
//!
//! A ROS2-style launch descriptor evaluator for sensor driver stacks.
//!
//! # Overview
//!
//! A launch description declares named arguments with defaults and a tree of
//! actions: process leaves and groups gated by a condition. Evaluating it:
//! - records caller overrides on the argument registry
//! - creates a fresh [`LaunchContext`] that resolves each argument lazily,
//!   at most once, and rejects self-referential defaults
//! - walks the tree depth-first, pruning groups whose condition is false
//!   without touching anything beneath them
//! - hands each resolved [`LaunchRequest`] to a [`ProcessSupervisor`]
//!
//! # Example Launch File
//!
//! ```yaml
//! version: "1.0"
//!
//! args:
//!   imu_topic:
//!     default: imu
//!   debug:
//!     default: false
//!
//! actions:
//!   - node:
//!       package: icm_20948
//!       executable: imu_node
//!       parameters:
//!         imu_topic: "$(arg imu_topic)"
//!   - group:
//!       if: "$(arg debug)"
//!       actions:
//!         - node:
//!             executable: rqt_plot
//!             arguments: ["/$(arg imu_topic)/orientation/x:y:z:w"]
//! ```
//!
//! Unquoted numbers are normalised by the YAML parser (`0x10` reads as `16`);
//! quote values whose exact text matters.

pub mod cli;
pub mod config;
pub mod descriptors;
pub mod runtime;

pub use cli::LaunchArgs;
pub use config::{
    Action, ArgumentError, ArgumentRegistry, Condition, ConditionError, GroupAction,
    LaunchArgument, LaunchContext, LaunchDescription, LaunchFile, LaunchFileError, LaunchRequest,
    OutputMode, OverridePolicy, ProcessAction, Substitution, SubstitutionError,
};
pub use runtime::{
    launch, walk, LaunchPlan, ProcessError, ProcessSpawner, ProcessSupervisor, WalkError,
    WalkSummary,
};
