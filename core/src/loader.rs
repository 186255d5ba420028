//! Sequential fixture loader.
//!
//! Items are fetched strictly in catalog order: the next fetch starts only
//! once the previous one has produced an outcome. Every fault is local to its
//! item; the loader records it and moves on.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::FixtureName;
use crate::context::RunContext;
use crate::error::FetchError;
use crate::sink::{Field, PresentationSink, kib};
use crate::source::ResourceSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Upper bound for a single fetch.
    pub timeout: Duration,
    /// Wait inserted before each fetch.
    pub pacing: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            timeout: Duration::from_secs(30),
            pacing: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    Loaded { bytes: usize },
    Failed { reason: FetchError },
}

impl LoadResult {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadResult::Loaded { .. })
    }
}

/// Outcome of one catalog item, yielded by [`LoadRun::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    /// Zero-based catalog position.
    pub index: usize,
    pub name: FixtureName,
    pub result: LoadResult,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub events: Vec<LoadEvent>,
    pub total_bytes: u64,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.events.iter().filter(|e| e.result.is_loaded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.events.len() - self.loaded_count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoaderOptions,
}

impl Loader {
    pub fn new(options: LoaderOptions) -> Self {
        Loader { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Starts a load cycle: clears previously loaded content, blanks the size
    /// column and disables the run triggers until the cycle completes.
    pub fn begin<'a>(
        &self,
        ctx: &'a mut RunContext,
        source: &'a dyn ResourceSource,
        sink: &'a mut dyn PresentationSink,
    ) -> LoadRun<'a> {
        ctx.reset_load();
        sink.set_triggers_enabled(false);
        for name in ctx.catalog() {
            sink.set_field(Field::size(name), String::new());
        }
        sink.set_field(Field::TotalSize, String::new());

        LoadRun {
            options: self.options.clone(),
            ctx,
            source,
            sink,
            index: 0,
            events: Vec::new(),
            finished: false,
        }
    }

    pub async fn load_all(
        &self,
        ctx: &mut RunContext,
        source: &dyn ResourceSource,
        sink: &mut dyn PresentationSink,
    ) -> LoadReport {
        self.begin(ctx, source, sink).finish().await
    }
}

/// One load cycle, driven one item at a time.
pub struct LoadRun<'a> {
    options: LoaderOptions,
    ctx: &'a mut RunContext,
    source: &'a dyn ResourceSource,
    sink: &'a mut dyn PresentationSink,
    index: usize,
    events: Vec<LoadEvent>,
    finished: bool,
}

impl<'a> LoadRun<'a> {
    /// Loads the next catalog item and returns its outcome. Returns `None`
    /// once the catalog is exhausted, after publishing the total and
    /// re-enabling the triggers.
    pub async fn step(&mut self) -> Option<LoadEvent> {
        let total = self.ctx.catalog().len();
        let Some(name) = self.ctx.catalog().get(self.index).cloned() else {
            self.complete();
            return None;
        };
        let index = self.index;
        self.index += 1;

        self.sink
            .set_status(format!("Please wait. Loading {} ({} of {})", name, index + 1, total));
        tokio::time::sleep(self.options.pacing).await;

        let slug = name.slug();
        let outcome = match tokio::time::timeout(self.options.timeout, self.source.fetch(&slug)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(self.options.timeout)),
        };

        let result = match outcome.and_then(|content| self.accept(&name, content)) {
            Ok(bytes) => {
                debug!(fixture = %name, bytes, "fixture loaded");
                self.sink.set_field(Field::size(&name), kib(bytes as u64));
                LoadResult::Loaded { bytes }
            }
            Err(reason) => {
                warn!(fixture = %name, error = %reason, "fixture failed to load");
                let status = if reason.is_timeout() {
                    format!("Error: time out while loading {}", slug)
                } else {
                    format!("Please wait. Error loading {}", self.source.locate(&slug))
                };
                self.sink.set_status(status);
                self.sink.set_field(Field::size(&name), "Error".to_string());
                LoadResult::Failed { reason }
            }
        };

        let event = LoadEvent { index, name, result };
        self.events.push(event.clone());
        Some(event)
    }

    fn accept(&mut self, name: &FixtureName, content: String) -> Result<usize, FetchError> {
        // Catalog names are unique, so a repeat can only mean a corrupted cycle.
        self.ctx
            .record_load(name, content)
            .ok_or_else(|| FetchError::Transport(format!("{} was already loaded in this cycle", name)))
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let total_bytes = self.ctx.totals().total_bytes;
        self.sink.set_field(Field::TotalSize, kib(total_bytes));
        self.sink.set_status("Ready.".to_string());
        self.sink.set_triggers_enabled(true);
        info!(
            total_bytes,
            loaded = self.events.iter().filter(|e| e.result.is_loaded()).count(),
            of = self.events.len(),
            "fixture load finished"
        );
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drives the remaining items and returns the cycle's report.
    pub async fn finish(mut self) -> LoadReport {
        while self.step().await.is_some() {}
        LoadReport {
            total_bytes: self.ctx.totals().total_bytes,
            events: self.events,
        }
    }
}
