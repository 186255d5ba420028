//! Serializable snapshot of a load + benchmark session.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::context::RunContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub name: String,
    pub slug: String,
    /// `None` when the fixture failed to load.
    pub bytes: Option<usize>,
    pub mean_ms: Option<f64>,
    pub variance_ms: Option<f64>,
    pub samples: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub generated_at: String,
    pub fixtures: Vec<FixtureRecord>,
    pub total_bytes: u64,
    pub total_mean_ms: f64,
}

impl RunRecord {
    /// One row per catalog fixture, in catalog order.
    pub fn from_context(ctx: &RunContext, timestamp: DateTime<Utc>) -> Self {
        let fixtures = ctx
            .catalog()
            .iter()
            .map(|name| {
                let stat = ctx.stat(name);
                FixtureRecord {
                    name: name.to_string(),
                    slug: name.slug(),
                    bytes: ctx.loaded().get(name).map(|f| f.bytes()),
                    mean_ms: stat.map(|s| s.mean * 1000.0),
                    variance_ms: stat.map(|s| s.variance * 1000.0),
                    samples: stat.map(|s| s.samples),
                }
            })
            .collect();
        let totals = ctx.totals();

        RunRecord {
            generated_at: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            fixtures,
            total_bytes: totals.total_bytes,
            total_mean_ms: totals.total_mean * 1000.0,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize run record")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FixtureCatalog, FixtureName};
    use crate::measure::BenchmarkStat;
    use chrono::TimeZone;

    #[test]
    fn test_record_reflects_context() {
        let mut ctx = RunContext::new(FixtureCatalog::new(["ok", "missing"]).expect("catalog"));
        let ok = FixtureName::new("ok");
        ctx.record_load(&ok, "12345".to_string());
        ctx.record_stat(
            &ok,
            BenchmarkStat {
                mean: 0.002,
                variance: 0.0005,
                samples: 9,
            },
        );
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("timestamp");

        let record = RunRecord::from_context(&ctx, timestamp);

        assert_eq!(record.generated_at, "2024-03-01T12:00:00Z");
        assert_eq!(record.total_bytes, 5);
        assert_eq!(record.fixtures[0].bytes, Some(5));
        assert_eq!(record.fixtures[0].samples, Some(9));
        assert!((record.total_mean_ms - 2.0).abs() < 1e-9);
        assert_eq!(record.fixtures[1].bytes, None);
        assert_eq!(record.fixtures[1].mean_ms, None);
    }

    #[test]
    fn test_write_json_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("latest.json");
        let ctx = RunContext::new(FixtureCatalog::new(["a"]).expect("catalog"));
        let record = RunRecord::from_context(&ctx, Utc::now());

        record.write_json(&path).expect("write");
        let back: RunRecord = serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(back, record);
    }
}
