//! Golden expectation corpora.
//!
//! A corpus is an ordered list of categories, each holding `source` /
//! `expected` pairs:
//!
//! ```json
//! [
//!   { "category": "Primary Expression",
//!     "cases": [ { "source": "42", "expected": { "type": "ExpressionStatement", ... } } ] }
//! ]
//! ```
//!
//! The same shape is accepted as YAML.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationCase {
    pub source: String,
    pub expected: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category: String,
    #[serde(default)]
    pub cases: Vec<ExpectationCase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    categories: Vec<Category>,
}

impl Corpus {
    pub fn new(categories: Vec<Category>) -> Self {
        Corpus { categories }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse JSON expectation corpus")
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parse YAML expectation corpus")
    }

    /// Loads a corpus file; `.yaml`/`.yml` are read as YAML, everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read expectation corpus {}", path.display()))?;
        let corpus = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
        .with_context(|| format!("load {}", path.display()))?;

        if corpus.is_empty() {
            bail!("expectation corpus {} contains no cases", path.display());
        }
        Ok(corpus)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Number of cases across all categories.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.cases.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cases in category order, then file order, with their category name.
    pub fn cases(&self) -> impl Iterator<Item = (&str, &ExpectationCase)> {
        self.categories
            .iter()
            .flat_map(|c| c.cases.iter().map(move |case| (c.category.as_str(), case)))
    }
}
