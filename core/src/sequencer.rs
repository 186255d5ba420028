//! Benchmark sequencer: measures the processor against loaded fixtures, one
//! fixture at a time, with pacing delays around every measurement burst.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::catalog::FixtureName;
use crate::context::RunContext;
use crate::measure::{BenchmarkStat, Measure};
use crate::processor::{Processor, top_level_units};
use crate::sink::{Field, PresentationSink, millis};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerOptions {
    /// Wait between marking a fixture as running and measuring it.
    pub pre_run_pacing: Duration,
    /// Wait after a measurement before moving to the next fixture.
    pub post_run_pacing: Duration,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        SequencerOptions {
            pre_run_pacing: Duration::from_millis(211),
            post_run_pacing: Duration::from_millis(211),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchEvent {
    pub index: usize,
    pub name: FixtureName,
    pub stat: BenchmarkStat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchReport {
    pub events: Vec<BenchEvent>,
    /// Sum of per-fixture means, in seconds.
    pub total_mean: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    options: SequencerOptions,
}

impl Sequencer {
    pub fn new(options: SequencerOptions) -> Self {
        Sequencer { options }
    }

    pub fn options(&self) -> &SequencerOptions {
        &self.options
    }

    /// Clears stored stats and blanks the time and variance columns of the
    /// whole catalog plus the total time. Safe to call repeatedly.
    pub fn reset(ctx: &mut RunContext, sink: &mut dyn PresentationSink) {
        ctx.reset_bench();
        for name in ctx.catalog() {
            sink.set_field(Field::time(name), String::new());
            sink.set_field(Field::variance(name), String::new());
        }
        sink.set_field(Field::TotalTime, String::new());
    }

    /// Validates the selection and starts a run.
    ///
    /// Every selected fixture must already be loaded; a selection that is not
    /// is rejected before any state or display is touched.
    pub fn begin<'a>(
        &self,
        ctx: &'a mut RunContext,
        selected: &[FixtureName],
        processor: &'a dyn Processor,
        measure: &'a mut dyn Measure,
        sink: &'a mut dyn PresentationSink,
    ) -> Result<BenchRun<'a>> {
        let mut sources = Vec::with_capacity(selected.len());
        for name in selected {
            let Some(fixture) = ctx.loaded().get(name) else {
                bail!("fixture '{}' has no loaded content; load fixtures before benchmarking", name);
            };
            sources.push((name.clone(), fixture.shared_content()));
        }

        sink.set_triggers_enabled(false);
        sink.set_status("Please wait. Running benchmarks...".to_string());
        Self::reset(ctx, sink);

        Ok(BenchRun {
            options: self.options.clone(),
            ctx,
            processor,
            measure,
            sink,
            sources,
            index: 0,
            retained: Vec::new(),
            events: Vec::new(),
            finished: false,
        })
    }

    pub async fn run(
        &self,
        ctx: &mut RunContext,
        selected: &[FixtureName],
        processor: &dyn Processor,
        measure: &mut dyn Measure,
        sink: &mut dyn PresentationSink,
    ) -> Result<BenchReport> {
        self.begin(ctx, selected, processor, measure, sink)?.finish().await
    }
}

/// One benchmark run over a fixed selection.
pub struct BenchRun<'a> {
    options: SequencerOptions,
    ctx: &'a mut RunContext,
    processor: &'a dyn Processor,
    measure: &'a mut dyn Measure,
    sink: &'a mut dyn PresentationSink,
    sources: Vec<(FixtureName, Arc<str>)>,
    index: usize,
    /// Per-iteration results of the current fixture, kept alive so the
    /// measured work stays observable.
    retained: Vec<usize>,
    events: Vec<BenchEvent>,
    finished: bool,
}

impl<'a> BenchRun<'a> {
    /// Measures the next fixture. `Ok(None)` once the selection is exhausted,
    /// after the total is published and triggers are re-enabled.
    ///
    /// A processor error aborts the run: it is returned as-is and the
    /// triggers stay disabled.
    pub async fn step(&mut self) -> Result<Option<BenchEvent>> {
        let Some((name, source)) = self.sources.get(self.index).cloned() else {
            self.complete();
            return Ok(None);
        };
        let index = self.index;

        self.sink.set_field(Field::time(&name), "Running...".to_string());
        tokio::time::sleep(self.options.pre_run_pacing).await;

        self.retained.clear();
        let retained = &mut self.retained;
        let processor = self.processor;
        let slug = name.slug();
        let stat = self
            .measure
            .measure(&slug, &mut || -> Result<()> {
                let tree = processor.process(&source)?;
                retained.push(top_level_units(&tree));
                Ok(())
            })
            .with_context(|| format!("benchmark of '{}' failed", name))?;
        black_box(&self.retained);

        self.ctx.record_stat(&name, stat);
        self.sink.set_field(Field::time(&name), millis(stat.mean));
        self.sink.set_field(Field::variance(&name), millis(stat.variance));
        debug!(fixture = %name, mean = stat.mean, variance = stat.variance, iterations = self.retained.len(), "fixture measured");

        tokio::time::sleep(self.options.post_run_pacing).await;
        self.index += 1;

        let event = BenchEvent { index, name, stat };
        self.events.push(event.clone());
        Ok(Some(event))
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let total_mean = self.ctx.totals().total_mean;
        self.sink.set_field(Field::TotalTime, millis(total_mean));
        self.sink.set_status("Ready.".to_string());
        self.sink.set_triggers_enabled(true);
        info!(fixtures = self.events.len(), total_mean, "benchmark run finished");
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Results retained during the most recent measurement.
    pub fn retained(&self) -> &[usize] {
        &self.retained
    }

    pub async fn finish(mut self) -> Result<BenchReport> {
        while self.step().await?.is_some() {}
        Ok(BenchReport {
            total_mean: self.ctx.totals().total_mean,
            events: self.events,
        })
    }
}
