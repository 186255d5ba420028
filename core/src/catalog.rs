//! Fixture names and the ordered catalog a run walks through.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Library sources benchmarked when no catalog is configured.
pub const DEFAULT_FIXTURES: &[&str] = &[
    "jQuery 1.7.1",
    "jQuery 1.6.4",
    "jQuery.Mobile 1.0",
    "Prototype 1.7.0.0",
    "Prototype 1.6.1",
    "Ext Core 3.1.0",
    "Ext Core 3.0.0",
    "MooTools 1.4.1",
    "MooTools 1.3.2",
    "Backbone 0.5.3",
    "Underscore 1.2.3",
];

/// Subset used by the quick run.
pub const DEFAULT_QUICK: &[&str] = &["jQuery 1.7.1", "jQuery.Mobile 1.0", "Backbone 0.5.3"];

static DEFAULT_CATALOG: Lazy<FixtureCatalog> = Lazy::new(|| FixtureCatalog {
    names: DEFAULT_FIXTURES.iter().map(|name| FixtureName::new(*name)).collect(),
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("fixture catalog is empty")]
    Empty,
    #[error("fixture names must not be blank")]
    BlankName,
    #[error("fixture '{0}' is listed more than once")]
    Duplicate(String),
    #[error("fixture '{0}' is not part of the catalog")]
    Unknown(String),
}

/// Identifier of a single fixture, e.g. `jQuery 1.7.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureName(String);

impl FixtureName {
    pub fn new(name: impl Into<String>) -> Self {
        FixtureName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource key and field id prefix for this fixture.
    pub fn slug(&self) -> String {
        slug(&self.0)
    }
}

impl fmt::Display for FixtureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FixtureName {
    fn from(value: &str) -> Self {
        FixtureName::new(value)
    }
}

impl From<String> for FixtureName {
    fn from(value: String) -> Self {
        FixtureName(value)
    }
}

/// Lower-cases `name` and replaces every whitespace character with `-`.
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Ordered, duplicate-free list of fixtures. Order defines load and benchmark order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCatalog {
    names: Vec<FixtureName>,
}

impl FixtureCatalog {
    pub fn new<I, S>(names: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<FixtureName>,
    {
        let names: Vec<FixtureName> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.as_str().trim().is_empty() {
                return Err(CatalogError::BlankName);
            }
            // Two names that collapse to one slug would fetch the same resource.
            if !seen.insert(name.slug()) {
                return Err(CatalogError::Duplicate(name.to_string()));
            }
        }

        Ok(FixtureCatalog { names })
    }

    pub fn default_catalog() -> &'static FixtureCatalog {
        &DEFAULT_CATALOG
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FixtureName> {
        self.names.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixtureName> {
        self.names.iter()
    }

    pub fn names(&self) -> &[FixtureName] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.as_str() == name)
    }

    /// Resolves `selected` against the catalog, keeping the caller's order.
    pub fn select<S: AsRef<str>>(&self, selected: &[S]) -> Result<Vec<FixtureName>, CatalogError> {
        selected
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                self.names
                    .iter()
                    .find(|n| n.as_str() == raw)
                    .cloned()
                    .ok_or_else(|| CatalogError::Unknown(raw.to_string()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FixtureCatalog {
    type Item = &'a FixtureName;
    type IntoIter = std::slice::Iter<'a, FixtureName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
