//! Presentation surface the loader and sequencer report into.

use std::collections::HashMap;

use crate::catalog::FixtureName;

/// One displayed cell of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Size(String),
    Time(String),
    Variance(String),
    TotalSize,
    TotalTime,
}

impl Field {
    pub fn size(name: &FixtureName) -> Self {
        Field::Size(name.slug())
    }

    pub fn time(name: &FixtureName) -> Self {
        Field::Time(name.slug())
    }

    pub fn variance(name: &FixtureName) -> Self {
        Field::Variance(name.slug())
    }

    /// Element id, e.g. `jquery-1.7.1-size` or `total-time`.
    pub fn id(&self) -> String {
        match self {
            Field::Size(slug) => format!("{slug}-size"),
            Field::Time(slug) => format!("{slug}-time"),
            Field::Variance(slug) => format!("{slug}-variance"),
            Field::TotalSize => "total-size".to_string(),
            Field::TotalTime => "total-time".to_string(),
        }
    }
}

pub trait PresentationSink {
    fn set_field(&mut self, field: Field, text: String);
    fn set_status(&mut self, text: String);
    /// Enables or disables both run triggers (quick and full).
    fn set_triggers_enabled(&mut self, enabled: bool);
}

/// KiB with one decimal.
pub fn kib(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / 1024.0)
}

/// Seconds rendered as milliseconds with one decimal. Also used for variance.
pub fn millis(seconds: f64) -> String {
    format!("{:.1}", seconds * 1000.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Field(Field, String),
    Status(String),
    Triggers(bool),
}

/// In-memory table model. Keeps the current cell values plus the full event
/// history, which is what renderers and tests read back.
#[derive(Debug, Default)]
pub struct TableSink {
    fields: HashMap<Field, String>,
    status: String,
    triggers_enabled: bool,
    events: Vec<SinkEvent>,
}

impl TableSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, field: &Field) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn triggers_enabled(&self) -> bool {
        self.triggers_enabled
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn trigger_events(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Triggers(enabled) => Some(*enabled),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Status(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl PresentationSink for TableSink {
    fn set_field(&mut self, field: Field, text: String) {
        self.events.push(SinkEvent::Field(field.clone(), text.clone()));
        self.fields.insert(field, text);
    }

    fn set_status(&mut self, text: String) {
        self.events.push(SinkEvent::Status(text.clone()));
        self.status = text;
    }

    fn set_triggers_enabled(&mut self, enabled: bool) {
        self.events.push(SinkEvent::Triggers(enabled));
        self.triggers_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ids() {
        let name = FixtureName::new("jQuery.Mobile 1.0");
        assert_eq!(Field::size(&name).id(), "jquery.mobile-1.0-size");
        assert_eq!(Field::time(&name).id(), "jquery.mobile-1.0-time");
        assert_eq!(Field::variance(&name).id(), "jquery.mobile-1.0-variance");
        assert_eq!(Field::TotalSize.id(), "total-size");
        assert_eq!(Field::TotalTime.id(), "total-time");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(kib(0), "0.0");
        assert_eq!(kib(1024), "1.0");
        assert_eq!(kib(93_868), "91.7");
        assert_eq!(millis(0.0123), "12.3");
        assert_eq!(millis(0.0), "0.0");
    }

    #[test]
    fn test_table_sink_tracks_latest_values() {
        let mut sink = TableSink::new();
        sink.set_field(Field::TotalSize, "1.0".to_string());
        sink.set_field(Field::TotalSize, "2.0".to_string());
        sink.set_status("Ready.".to_string());
        sink.set_triggers_enabled(true);

        assert_eq!(sink.field(&Field::TotalSize), Some("2.0"));
        assert_eq!(sink.status(), "Ready.");
        assert!(sink.triggers_enabled());
        assert_eq!(sink.events().len(), 4);
        assert_eq!(sink.trigger_events(), vec![true]);
    }
}
