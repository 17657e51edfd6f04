//! Runtime components: tree walking and process supervision

pub mod plan;
pub mod process;
pub mod walker;

pub use plan::*;
pub use process::*;
pub use walker::*;
