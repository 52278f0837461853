use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Document;
use crate::pipeline::{GenerationReport, StreamEvent, VersionFailure};

/// Machine-readable result of a generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Versions attempted after clamping
    pub requested: usize,
    /// Surviving documents in request order
    pub versions: Vec<Document>,
    pub failures: Vec<VersionFailure>,
}

impl GenerationOutput {
    pub fn from_report(request_id: Uuid, report: &GenerationReport) -> Self {
        Self {
            request_id,
            generated_at: Utc::now(),
            requested: report.attempted(),
            versions: report.documents(),
            failures: report.failures(),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }

    /// Write as pretty JSON to any writer
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self).context("Failed to write JSON")?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Error body for a request that produced no documents
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
    pub request_id: Uuid,
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<VersionFailure>,
}

/// Human-readable rendering of the generated versions
pub struct HumanEmails<'a> {
    documents: &'a [Document],
}

impl<'a> HumanEmails<'a> {
    pub fn new(documents: &'a [Document]) -> Self {
        Self { documents }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        for (index, document) in self.documents.iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            output.push_str(&format!("=== Versión {} ===\n", index + 1));
            output.push_str(&format!("Asunto: {}\n\n", document.subject));
            output.push_str(document.body.trim_end());
            output.push('\n');
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Write one event as a `data: <json>` frame and flush it
pub fn write_sse_event(mut writer: impl Write, event: &StreamEvent) -> Result<()> {
    let json = serde_json::to_string(event).context("Failed to encode stream event")?;
    write!(writer, "data: {}\n\n", json)?;
    writer.flush()?;
    Ok(())
}
