//! Structural equivalence checking by canonical serialization.
//!
//! Two trees are equivalent iff their canonical forms are identical. The
//! canonical form is pretty-printed JSON with four-space indentation and
//! object keys in sorted order, so it is independent of the order keys were
//! produced in, but sensitive to everything else (array order, `null` vs.
//! absent). Whole-valued floats print as integers, so `1e3` equals `1000`.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::error::ProcessError;
use crate::processor::Processor;

/// JSON pointer to the first top-level unit of a parsed program.
pub const DEFAULT_FOCUS: &str = "/body/0";

static NULL: Value = Value::Null;

pub fn canonical_form(value: &Value) -> String {
    let sorted = sort_keys(value);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    match sorted.serialize(&mut ser) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => sorted.to_string(),
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        Value::Number(n) => Value::Number(integral(n).unwrap_or_else(|| n.clone())),
        other => other.clone(),
    }
}

/// Integer form of a whole-valued float, so `1e3` and `1000` print alike.
fn integral(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return None;
    }
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Number::from(f as u64))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Pass,
    Fail {
        expected: String,
        actual: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ProcessError>,
    },
}

impl ComparisonOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, ComparisonOutcome::Pass)
    }
}

/// Three-part report of one failed case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseFailure {
    pub category: String,
    pub code: String,
    pub expected: String,
    pub actual: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessError>,
}

impl CaseFailure {
    /// 1-based line of the first difference between the canonical forms.
    pub fn first_divergence(&self) -> Option<usize> {
        let mut expected = self.expected.lines();
        let mut actual = self.actual.lines();
        let mut line = 1;
        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return None,
                (e, a) if e != a => return Some(line),
                _ => line += 1,
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub total: usize,
    pub failures: Vec<CaseFailure>,
    pub elapsed: Duration,
}

impl CheckReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        let ms = self.elapsed.as_millis();
        if self.failures.is_empty() {
            format!("{} tests. No failure. {} ms", self.total, ms)
        } else {
            format!("{} tests. Failures: {}. {} ms", self.total, self.failures.len(), ms)
        }
    }
}

pub struct Checker<'p> {
    processor: &'p dyn Processor,
    focus: String,
}

impl<'p> Checker<'p> {
    pub fn new(processor: &'p dyn Processor) -> Self {
        Checker {
            processor,
            focus: DEFAULT_FOCUS.to_string(),
        }
    }

    /// JSON pointer selecting the compared subtree; empty compares the whole tree.
    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = focus.into();
        self
    }

    pub fn focus(&self) -> &str {
        &self.focus
    }

    pub fn check(&self, source: &str, expected: &Value) -> ComparisonOutcome {
        let expected = canonical_form(expected);
        match self.processor.process(source) {
            Ok(tree) => {
                let actual = canonical_form(self.focused(&tree));
                if actual == expected {
                    ComparisonOutcome::Pass
                } else {
                    ComparisonOutcome::Fail {
                        expected,
                        actual,
                        error: None,
                    }
                }
            }
            Err(err) => {
                let actual = match serde_json::to_value(&err) {
                    Ok(value) => canonical_form(&value),
                    Err(_) => err.to_string(),
                };
                ComparisonOutcome::Fail {
                    expected,
                    actual,
                    error: Some(err),
                }
            }
        }
    }

    fn focused<'t>(&self, tree: &'t Value) -> &'t Value {
        if self.focus.is_empty() {
            return tree;
        }
        tree.pointer(&self.focus).unwrap_or(&NULL)
    }

    /// Checks every case of `corpus`; a failing case never stops the rest.
    pub fn run_corpus(&self, corpus: &Corpus) -> CheckReport {
        let started = Instant::now();
        let mut report = CheckReport::default();

        for (category, case) in corpus.cases() {
            report.total += 1;
            match self.check(&case.source, &case.expected) {
                ComparisonOutcome::Pass => debug!(category, source = %case.source, "case passed"),
                ComparisonOutcome::Fail {
                    expected,
                    actual,
                    error,
                } => {
                    debug!(category, source = %case.source, errored = error.is_some(), "case failed");
                    report.failures.push(CaseFailure {
                        category: category.to_string(),
                        code: case.source.clone(),
                        expected,
                        actual,
                        error,
                    });
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(total = report.total, failures = report.failures.len(), "corpus checked");
        report
    }
}
