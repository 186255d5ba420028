//! Terminal rendering of the results table and checker reports.

use std::fmt::Write as _;

use parsebench_core::checker::CheckReport;
use parsebench_core::sink::{Field, PresentationSink, TableSink};
use parsebench_core::FixtureCatalog;

const HEADERS: [&str; 4] = ["Source", "Size (KiB)", "Time (ms)", "Variance"];

/// Table model that echoes status changes to stderr as they happen.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    table: TableSink,
    echo: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        ConsoleSink {
            table: TableSink::new(),
            echo: true,
        }
    }

    pub fn silent() -> Self {
        ConsoleSink {
            table: TableSink::new(),
            echo: false,
        }
    }

    pub fn table(&self) -> &TableSink {
        &self.table
    }
}

impl PresentationSink for ConsoleSink {
    fn set_field(&mut self, field: Field, text: String) {
        self.table.set_field(field, text);
    }

    fn set_status(&mut self, text: String) {
        if self.echo && !text.is_empty() && text != self.table.status() {
            eprintln!("{text}");
        }
        self.table.set_status(text);
    }

    fn set_triggers_enabled(&mut self, enabled: bool) {
        self.table.set_triggers_enabled(enabled);
    }
}

pub fn render_table(table: &TableSink, catalog: &FixtureCatalog) -> String {
    let mut rows: Vec<[String; 4]> = catalog
        .iter()
        .map(|name| {
            [
                name.to_string(),
                cell(table, &Field::size(name)),
                cell(table, &Field::time(name)),
                cell(table, &Field::variance(name)),
            ]
        })
        .collect();
    rows.push([
        "Total".to_string(),
        cell(table, &Field::TotalSize),
        cell(table, &Field::TotalTime),
        String::new(),
    ]);

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut out = String::new();
    let header = HEADERS.map(str::to_string);
    for row in std::iter::once(&header).chain(rows.iter()) {
        let _ = write!(out, "{:<w$}", row[0], w = widths[0]);
        for (text, width) in row[1..].iter().zip(&widths[1..]) {
            let _ = write!(out, "  {:>w$}", text, w = *width);
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }
    out
}

fn cell(table: &TableSink, field: &Field) -> String {
    table.field(field).unwrap_or_default().to_string()
}

/// Three-part block per failure followed by the summary line.
pub fn render_check_report(report: &CheckReport) -> String {
    let mut out = String::new();
    for failure in &report.failures {
        let _ = writeln!(out, "[{}] Code:", failure.category);
        let _ = writeln!(out, "{}", failure.code);
        let _ = writeln!(out, "Expected:");
        let _ = writeln!(out, "{}", failure.expected);
        let _ = writeln!(out, "Actual:");
        let _ = writeln!(out, "{}", failure.actual);
        if let Some(line) = failure.first_divergence() {
            let _ = writeln!(out, "First difference at line {line}");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{}", report.summary());
    out
}
