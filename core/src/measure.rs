//! Timing primitive used by the benchmark sequencer.
//!
//! The sequencer only relies on [`Measure`]; [`Sampler`] is the bundled
//! implementation and can be swapped for anything producing a mean and a
//! variance for a routine.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean and variance of one routine's per-call wall time, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStat {
    pub mean: f64,
    pub variance: f64,
    pub samples: usize,
}

impl BenchmarkStat {
    /// Sample mean and unbiased sample variance. A single sample has zero variance.
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return BenchmarkStat {
                mean: 0.0,
                variance: 0.0,
                samples: 0,
            };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        BenchmarkStat {
            mean,
            variance,
            samples: n,
        }
    }
}

/// Runs `routine` as often as needed for a stable `{mean, variance}`.
///
/// Errors returned by `routine` abort the measurement and are handed back
/// unchanged.
pub trait Measure {
    fn measure(&mut self, name: &str, routine: &mut dyn FnMut() -> Result<()>) -> Result<BenchmarkStat>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerOptions {
    pub warmup: usize,
    pub min_samples: usize,
    pub min_time: Duration,
    pub max_time: Duration,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        SamplerOptions {
            warmup: 1,
            min_samples: 5,
            min_time: Duration::from_secs(1),
            max_time: Duration::from_secs(5),
        }
    }
}

/// Wall-clock sampler: warm up, then time individual calls until both
/// `min_samples` and `min_time` are reached or `max_time` runs out.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    options: SamplerOptions,
}

impl Sampler {
    pub fn new(options: SamplerOptions) -> Self {
        Sampler { options }
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }
}

impl Measure for Sampler {
    fn measure(&mut self, name: &str, routine: &mut dyn FnMut() -> Result<()>) -> Result<BenchmarkStat> {
        for _ in 0..self.options.warmup {
            routine()?;
        }

        let min_samples = self.options.min_samples.max(1);
        let started = Instant::now();
        let mut samples = Vec::with_capacity(min_samples);
        loop {
            let tick = Instant::now();
            routine()?;
            samples.push(tick.elapsed().as_secs_f64());

            let elapsed = started.elapsed();
            let enough = samples.len() >= min_samples && elapsed >= self.options.min_time;
            if enough || elapsed >= self.options.max_time {
                break;
            }
        }

        let stat = BenchmarkStat::from_samples(&samples);
        debug!(benchmark = name, samples = stat.samples, mean = stat.mean, "sampling finished");
        Ok(stat)
    }
}
