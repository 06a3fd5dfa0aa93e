//! Package-related type definitions

use std::collections::HashSet;
use std::fmt;

use pinstall_errors::InstallError;
use serde::{Deserialize, Serialize};

use crate::Autoload;

/// Archive location and integrity metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Distribution {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub reference: String,
    pub shasum: String,
}

/// One installable package, as recorded in the lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dist: Distribution,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub autoload: Autoload,
}

impl Package {
    /// Create a package record pointing at an archive URL
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        archive_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dist: Distribution {
                kind: "zip".to_string(),
                url: archive_url.into(),
                ..Distribution::default()
            },
            description: String::new(),
            autoload: Autoload::default(),
        }
    }

    /// Archive URL for this package
    #[must_use]
    pub fn archive_url(&self) -> &str {
        &self.dist.url
    }

    /// Split the name at its first `/` into `(namespace, leaf)`
    ///
    /// # Errors
    ///
    /// Returns `InstallError::InvalidPackageName` when either part is
    /// missing, or a part is `.`, `..`, or contains a path separator.
    pub fn namespace_and_leaf(&self) -> Result<(&str, &str), InstallError> {
        let invalid = || InstallError::InvalidPackageName {
            name: self.name.clone(),
        };
        let (namespace, leaf) = self.name.split_once('/').ok_or_else(invalid)?;
        for part in [namespace, leaf] {
            if part.is_empty() || part == "." || part == ".." || part.contains(['/', '\\']) {
                return Err(invalid());
            }
        }
        Ok((namespace, leaf))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.version)
        }
    }
}

/// Packages selected for one install run, unique by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    packages: Vec<Package>,
}

impl PackageSet {
    /// Build a set from primary packages, then dev packages when requested
    ///
    /// The first record for a name wins, so a primary entry shadows a dev
    /// entry of the same name. Order is primary order followed by the dev
    /// records that were not already present.
    #[must_use]
    pub fn merge(primary: &[Package], dev: &[Package], include_dev: bool) -> Self {
        let dev: &[Package] = if include_dev { dev } else { &[] };
        let mut seen = HashSet::with_capacity(primary.len() + dev.len());
        let packages = primary
            .iter()
            .chain(dev)
            .filter(|package| seen.insert(package.name.as_str()))
            .cloned()
            .collect();
        Self { packages }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let packages: Vec<Package> = iter.into_iter().collect();
        Self::merge(&packages, &[], false)
    }
}

impl<'a> IntoIterator for &'a PackageSet {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}
