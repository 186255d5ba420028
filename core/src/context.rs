//! Mutable state of a load/benchmark session, owned by the driving caller.
//!
//! Only one component writes at a time: the loader and the sequencer each take
//! `&mut RunContext` for the duration of their run and record results at item
//! completion points.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{FixtureCatalog, FixtureName};
use crate::measure::BenchmarkStat;

#[derive(Debug, Clone)]
pub struct LoadedFixture {
    content: Arc<str>,
    bytes: usize,
}

impl LoadedFixture {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn shared_content(&self) -> Arc<str> {
        Arc::clone(&self.content)
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

/// Successfully fetched fixtures of the current load cycle.
#[derive(Debug, Clone, Default)]
pub struct LoadedFixtures {
    entries: HashMap<FixtureName, LoadedFixture>,
}

impl LoadedFixtures {
    pub fn get(&self, name: &FixtureName) -> Option<&LoadedFixture> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &FixtureName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write-once: a second insert for the same name within a cycle is ignored.
    fn insert(&mut self, name: &FixtureName, content: String) -> Option<usize> {
        if self.entries.contains_key(name) {
            return None;
        }
        let bytes = content.len();
        self.entries.insert(
            name.clone(),
            LoadedFixture {
                content: Arc::from(content),
                bytes,
            },
        );
        Some(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunTotals {
    pub total_bytes: u64,
    /// Sum of per-fixture mean latencies, in seconds.
    pub total_mean: f64,
}

#[derive(Debug, Clone)]
pub struct RunContext {
    catalog: FixtureCatalog,
    loaded: LoadedFixtures,
    stats: HashMap<FixtureName, BenchmarkStat>,
    totals: RunTotals,
}

impl RunContext {
    pub fn new(catalog: FixtureCatalog) -> Self {
        RunContext {
            catalog,
            loaded: LoadedFixtures::default(),
            stats: HashMap::new(),
            totals: RunTotals::default(),
        }
    }

    pub fn catalog(&self) -> &FixtureCatalog {
        &self.catalog
    }

    pub fn loaded(&self) -> &LoadedFixtures {
        &self.loaded
    }

    pub fn stat(&self, name: &FixtureName) -> Option<&BenchmarkStat> {
        self.stats.get(name)
    }

    pub fn stats_len(&self) -> usize {
        self.stats.len()
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    pub(crate) fn reset_load(&mut self) {
        self.loaded = LoadedFixtures::default();
        self.totals.total_bytes = 0;
    }

    pub(crate) fn reset_bench(&mut self) {
        self.stats.clear();
        self.totals.total_mean = 0.0;
    }

    /// Stores fetched content and adds its size to the byte total.
    /// Returns `None` when the fixture was already loaded in this cycle.
    pub(crate) fn record_load(&mut self, name: &FixtureName, content: String) -> Option<usize> {
        let bytes = self.loaded.insert(name, content)?;
        self.totals.total_bytes += bytes as u64;
        Some(bytes)
    }

    pub(crate) fn record_stat(&mut self, name: &FixtureName, stat: BenchmarkStat) {
        self.totals.total_mean += stat.mean;
        self.stats.insert(name.clone(), stat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RunContext {
        RunContext::new(FixtureCatalog::new(["a", "b"]).expect("catalog"))
    }

    #[test]
    fn test_record_load_is_write_once() {
        let mut ctx = context();
        let a = FixtureName::new("a");
        assert_eq!(ctx.record_load(&a, "abc".to_string()), Some(3));
        assert_eq!(ctx.record_load(&a, "abcdef".to_string()), None);
        assert_eq!(ctx.totals().total_bytes, 3);
        assert_eq!(ctx.loaded().get(&a).map(|f| f.content()), Some("abc"));
    }

    #[test]
    fn test_resets_are_independent() {
        let mut ctx = context();
        let a = FixtureName::new("a");
        ctx.record_load(&a, "abcd".to_string());
        ctx.record_stat(
            &a,
            BenchmarkStat {
                mean: 0.5,
                variance: 0.0,
                samples: 1,
            },
        );

        ctx.reset_bench();
        assert_eq!(ctx.stats_len(), 0);
        assert_eq!(ctx.totals().total_mean, 0.0);
        assert_eq!(ctx.totals().total_bytes, 4);

        ctx.reset_load();
        assert!(ctx.loaded().is_empty());
        assert_eq!(ctx.totals().total_bytes, 0);
    }
}
