//! Package lookup used to compute default file paths

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable listing install prefixes, `:`-separated
pub const AMENT_PREFIX_PATH: &str = "AMENT_PREFIX_PATH";

/// Marker directory every installed package registers itself in
const PACKAGE_INDEX: &str = "share/ament_index/resource_index/packages";

/// Maps a package name to its install prefix
pub trait PackageLocator {
    /// Install prefix containing the package
    fn package_prefix(&self, package: &str) -> Result<PathBuf, LocatorError>;

    /// `<prefix>/share/<package>`
    fn share_directory(&self, package: &str) -> Result<PathBuf, LocatorError> {
        Ok(self.package_prefix(package)?.join("share").join(package))
    }

    /// `<prefix>/lib/<package>`, where package executables are installed
    fn lib_directory(&self, package: &str) -> Result<PathBuf, LocatorError> {
        Ok(self.package_prefix(package)?.join("lib").join(package))
    }
}

/// Locator backed by an ament resource index on disk
#[derive(Debug, Clone, Default)]
pub struct AmentIndex {
    prefixes: Vec<PathBuf>,
}

impl AmentIndex {
    /// Search exactly these prefixes, in order
    pub fn new(prefixes: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
        }
    }

    /// Prefixes from `AMENT_PREFIX_PATH`
    pub fn from_env() -> Self {
        let prefixes = std::env::var_os(AMENT_PREFIX_PATH)
            .map(|paths| {
                std::env::split_paths(&paths)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { prefixes }
    }

    /// Search `extra` before the prefixes already known
    pub fn with_prefixes_first(mut self, extra: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut prefixes: Vec<PathBuf> = extra.into_iter().collect();
        prefixes.append(&mut self.prefixes);
        self.prefixes = prefixes;
        self
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    fn is_registered(prefix: &Path, package: &str) -> bool {
        prefix.join(PACKAGE_INDEX).join(package).is_file()
    }
}

impl PackageLocator for AmentIndex {
    fn package_prefix(&self, package: &str) -> Result<PathBuf, LocatorError> {
        self.prefixes
            .iter()
            .find(|prefix| Self::is_registered(prefix, package))
            .cloned()
            .ok_or_else(|| LocatorError::PackageNotFound {
                package: package.to_string(),
                searched: self.prefixes.clone(),
            })
    }
}

/// Locator with an explicit package to prefix map
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    packages: HashMap<String, PathBuf>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package: impl Into<String>, prefix: impl Into<PathBuf>) -> Self {
        self.packages.insert(package.into(), prefix.into());
        self
    }
}

impl PackageLocator for StaticLocator {
    fn package_prefix(&self, package: &str) -> Result<PathBuf, LocatorError> {
        self.packages
            .get(package)
            .cloned()
            .ok_or_else(|| LocatorError::PackageNotFound {
                package: package.to_string(),
                searched: Vec::new(),
            })
    }
}

/// Errors that can occur during package lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("Package '{package}' not found (searched {} prefixes)", .searched.len())]
    PackageNotFound {
        package: String,
        searched: Vec<PathBuf>,
    },
}
