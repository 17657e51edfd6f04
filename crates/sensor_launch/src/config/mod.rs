//! Launch descriptions, arguments, and substitution resolution

mod action;
mod argument;
mod condition;
mod context;
mod description;
mod launch_file;
mod locator;
mod substitution;

pub use action::*;
pub use argument::*;
pub use condition::*;
pub use context::*;
pub use description::*;
pub use launch_file::*;
pub use locator::*;
pub use substitution::*;
