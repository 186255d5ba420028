//! Parser benchmark and conformance harness.
//!
//! Three pieces share one [`context::RunContext`]:
//!
//! - [`loader`] fetches the fixture catalog sequentially, with pacing and a
//!   per-fixture timeout, and reports sizes into a [`sink::PresentationSink`].
//! - [`sequencer`] measures a [`processor::Processor`] over the loaded
//!   fixtures one at a time and reports mean and variance.
//! - [`checker`] compares processor output against a golden [`corpus`] by
//!   canonical serialization.

pub mod catalog;
pub mod checker;
pub mod config;
pub mod context;
pub mod corpus;
pub mod error;
pub mod loader;
pub mod measure;
pub mod processor;
pub mod record;
pub mod sequencer;
pub mod sink;
pub mod source;

#[cfg(test)]
mod loader_test;

pub use catalog::{FixtureCatalog, FixtureName};
pub use checker::{CheckReport, Checker, ComparisonOutcome, canonical_form};
pub use config::HarnessConfig;
pub use context::RunContext;
pub use corpus::Corpus;
pub use error::{FetchError, ProcessError};
pub use loader::{LoadReport, Loader, LoaderOptions};
pub use measure::{BenchmarkStat, Measure, Sampler, SamplerOptions};
pub use processor::{CommandProcessor, Processor};
pub use record::RunRecord;
pub use sequencer::{BenchReport, Sequencer, SequencerOptions};
pub use sink::{Field, PresentationSink, TableSink};
pub use source::{DirSource, HttpSource, ResourceSource};
