//! Harness configuration, read from TOML.
//!
//! ```toml
//! [source]
//! base_url = "http://127.0.0.1:8000/3rdparty"   # or: dir = "3rdparty"
//!
//! [catalog]
//! fixtures = ["jQuery 1.7.1", "Backbone 0.5.3"]
//! quick = ["Backbone 0.5.3"]
//!
//! [loader]
//! timeout_ms = 30000
//! pacing_ms = 100
//!
//! [processor]
//! command = ["node", "tools/parse.js"]
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, DEFAULT_FIXTURES, DEFAULT_QUICK, FixtureCatalog, FixtureName};
use crate::checker::DEFAULT_FOCUS;
use crate::loader::LoaderOptions;
use crate::measure::SamplerOptions;
use crate::sequencer::SequencerOptions;
use crate::source::{DEFAULT_EXTENSION, DirSource, HttpSource, ResourceSource};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub base_url: Option<String>,
    pub dir: Option<PathBuf>,
    pub extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: None,
            dir: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub fixtures: Vec<String>,
    pub quick: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            fixtures: DEFAULT_FIXTURES.iter().map(|s| s.to_string()).collect(),
            quick: DEFAULT_QUICK.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub timeout_ms: u64,
    pub pacing_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let defaults = LoaderOptions::default();
        LoaderConfig {
            timeout_ms: defaults.timeout.as_millis() as u64,
            pacing_ms: defaults.pacing.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    pub pre_run_pacing_ms: u64,
    pub post_run_pacing_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let defaults = SequencerOptions::default();
        SequencerConfig {
            pre_run_pacing_ms: defaults.pre_run_pacing.as_millis() as u64,
            post_run_pacing_ms: defaults.post_run_pacing.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    pub warmup: usize,
    pub min_samples: usize,
    pub min_time_ms: u64,
    pub max_time_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        let defaults = SamplerOptions::default();
        SamplerConfig {
            warmup: defaults.warmup,
            min_samples: defaults.min_samples,
            min_time_ms: defaults.min_time.as_millis() as u64,
            max_time_ms: defaults.max_time.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// JSON pointer of the compared subtree.
    pub focus: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            focus: DEFAULT_FOCUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub source: SourceConfig,
    pub catalog: CatalogConfig,
    pub loader: LoaderConfig,
    pub sequencer: SequencerConfig,
    pub sampler: SamplerConfig,
    pub processor: ProcessorConfig,
    pub checker: CheckerConfig,
}

impl HarnessConfig {
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: HarnessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.base_url.is_some() && self.source.dir.is_some() {
            return Err(ConfigError::Invalid(
                "source.base_url and source.dir are mutually exclusive".to_string(),
            ));
        }
        if self.loader.timeout_ms == 0 {
            return Err(ConfigError::Invalid("loader.timeout_ms must be positive".to_string()));
        }
        if self.sampler.max_time_ms < self.sampler.min_time_ms {
            return Err(ConfigError::Invalid(
                "sampler.max_time_ms must not be below sampler.min_time_ms".to_string(),
            ));
        }
        if !self.checker.focus.is_empty() && !self.checker.focus.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "checker.focus '{}' is not a JSON pointer",
                self.checker.focus
            )));
        }
        self.quick_selection()?;
        Ok(())
    }

    pub fn catalog(&self) -> ConfigResult<FixtureCatalog> {
        Ok(FixtureCatalog::new(self.catalog.fixtures.iter().map(String::as_str))?)
    }

    /// The quick subset, resolved against the catalog in its configured order.
    pub fn quick_selection(&self) -> ConfigResult<Vec<FixtureName>> {
        let catalog = self.catalog()?;
        Ok(catalog.select(&self.catalog.quick)?)
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            timeout: Duration::from_millis(self.loader.timeout_ms),
            pacing: Duration::from_millis(self.loader.pacing_ms),
        }
    }

    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            pre_run_pacing: Duration::from_millis(self.sequencer.pre_run_pacing_ms),
            post_run_pacing: Duration::from_millis(self.sequencer.post_run_pacing_ms),
        }
    }

    pub fn sampler_options(&self) -> SamplerOptions {
        SamplerOptions {
            warmup: self.sampler.warmup,
            min_samples: self.sampler.min_samples,
            min_time: Duration::from_millis(self.sampler.min_time_ms),
            max_time: Duration::from_millis(self.sampler.max_time_ms),
        }
    }

    /// HTTP source when `base_url` is set, otherwise a directory source
    /// (`3rdparty` when nothing is configured).
    pub fn resource_source(&self) -> anyhow::Result<Box<dyn ResourceSource>> {
        let extension = self.source.extension.clone();
        match (&self.source.base_url, &self.source.dir) {
            (Some(url), _) => Ok(Box::new(HttpSource::new(url)?.with_extension(extension))),
            (None, Some(dir)) => Ok(Box::new(DirSource::new(dir.clone()).with_extension(extension))),
            (None, None) => Ok(Box::new(DirSource::new("3rdparty").with_extension(extension))),
        }
    }
}
