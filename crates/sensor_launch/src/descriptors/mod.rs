//! Launch descriptions compiled into the binary

pub mod icm_20948;

use crate::config::{ArgumentError, LaunchDescription, LocatorError, PackageLocator};

/// Names accepted by [`builtin`]
pub const BUILTIN: &[&str] = &[icm_20948::NAME];

/// Build the built-in description called `name`, if there is one
pub fn builtin(
    name: &str,
    locator: &dyn PackageLocator,
) -> Option<Result<LaunchDescription, DescriptorError>> {
    match name {
        icm_20948::NAME => Some(icm_20948::describe(locator)),
        _ => None,
    }
}

/// Errors raised while assembling a built-in description
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}
