// packages/proxy/src/recording/exporter.rs
//! Export recorded invocations
//!
//! Supports:
//! - JSON (one pretty-printed array)
//! - JSON lines (one compact event per line, for log shippers)

use crate::recording::recorder::InvocationEvent;
use crate::utils::errors::{ProxyError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON array
    Json,

    /// Newline-delimited JSON
    JsonLines,
}

/// Exporter for invocation recordings
pub struct Exporter {
    format: ExportFormat,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// Export events to string
    pub fn export(&self, events: &[InvocationEvent]) -> Result<String> {
        debug!("Exporting {} events to {:?} format", events.len(), self.format);

        match self.format {
            ExportFormat::Json => self.export_json(events),
            ExportFormat::JsonLines => self.export_json_lines(events),
        }
    }

    /// Export events into a file, replacing its contents
    pub fn export_to_file(&self, events: &[InvocationEvent], path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rendered = self.export(events)?;
        fs::write(path, rendered).map_err(|e| {
            ProxyError::ExportFailed(format!("Cannot write {}: {}", path.display(), e))
        })
    }

    fn export_json(&self, events: &[InvocationEvent]) -> Result<String> {
        serde_json::to_string_pretty(events)
            .map_err(|e| ProxyError::ExportFailed(format!("JSON serialization error: {}", e)))
    }

    fn export_json_lines(&self, events: &[InvocationEvent]) -> Result<String> {
        let mut out = String::new();
        for event in events {
            let line = serde_json::to_string(event)
                .map_err(|e| ProxyError::ExportFailed(format!("JSON serialization error: {}", e)))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::recorder::EventType;

    fn create_test_event(id: &str) -> InvocationEvent {
        InvocationEvent {
            id: id.to_string(),
            call_id: "01HZY".to_string(),
            event_type: EventType::CallCompleted,
            method: "Service.run".to_string(),
            timestamp_ns: 1_234_567_890_000_000_000,
            data: serde_json::json!({"result": "ok"}),
            duration_us: Some(1000),
        }
    }

    #[test]
    fn test_json_export() {
        let exporter = Exporter::new(ExportFormat::Json);
        let json = exporter.export(&[create_test_event("evt_123")]).unwrap();

        let parsed: Vec<InvocationEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "evt_123");
        assert!(json.contains("call_completed"));
    }

    #[test]
    fn test_json_lines_export() {
        let exporter = Exporter::new(ExportFormat::JsonLines);
        let events = vec![create_test_event("a"), create_test_event("b")];

        let rendered = exporter.export(&events).unwrap();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: InvocationEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.id, "b");
    }

    #[test]
    fn test_empty_json_lines() {
        let exporter = Exporter::new(ExportFormat::JsonLines);
        assert_eq!(exporter.export(&[]).unwrap(), "");
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.json");

        Exporter::new(ExportFormat::Json)
            .export_to_file(&[create_test_event("evt_1")], &path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("evt_1"));

        let missing = dir.path().join("no/such/dir/calls.json");
        let err = Exporter::new(ExportFormat::Json)
            .export_to_file(&[], &missing)
            .unwrap_err();
        assert!(matches!(err, ProxyError::ExportFailed(_)));
    }
}
