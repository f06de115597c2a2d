//! JSON output format writer.

use crate::error::{Error, Result};
use crate::inference::SpeedChange;
use crate::output::{AnomalyEvent, OutputWriter};
use crate::vision::WindowParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// JSON result file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResultFile {
    /// Source spectrogram file name.
    pub source_file: String,
    /// Analysis timestamp.
    pub analysis_date: DateTime<Utc>,
    /// Recording duration in seconds.
    pub audio_duration_seconds: f64,
    /// Scan settings.
    pub settings: JsonSettings,
    /// Detected events in window order.
    pub events: Vec<JsonEvent>,
    /// Summary statistics.
    pub summary: JsonSummary,
}

/// Scan settings for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSettings {
    /// Window stride in pixels.
    pub step: u32,
    /// Window width in pixels.
    pub window_width: u32,
    /// First window offset in pixels.
    pub offset: u32,
}

/// Single event in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEvent {
    /// Window index.
    pub window_index: usize,
    /// Window start in seconds.
    pub timestamp_seconds: f64,
    /// Detected speed change.
    pub speedup: SpeedChange,
}

/// Summary statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Total number of events.
    pub total_events: usize,
    /// Event count per speed change.
    pub by_speedup: BTreeMap<String, usize>,
}

/// Writer for JSON event output files.
pub struct JsonResultWriter {
    events: Vec<JsonEvent>,
    output_path: PathBuf,
    source_file: String,
    audio_duration: f64,
    settings: WindowParams,
}

impl JsonResultWriter {
    /// Create a new JSON result writer.
    pub fn new(
        output_path: &Path,
        source_file: &str,
        audio_duration: f64,
        settings: WindowParams,
    ) -> Self {
        Self {
            events: Vec::new(),
            output_path: output_path.to_path_buf(),
            source_file: source_file.to_string(),
            audio_duration,
            settings,
        }
    }

    fn compute_summary(&self) -> JsonSummary {
        let mut by_speedup = BTreeMap::new();
        for event in &self.events {
            *by_speedup.entry(event.speedup.to_string()).or_insert(0) += 1;
        }
        JsonSummary {
            total_events: self.events.len(),
            by_speedup,
        }
    }
}

impl OutputWriter for JsonResultWriter {
    fn write_header(&mut self) -> Result<()> {
        // Written in full at finalize
        Ok(())
    }

    fn write_event(&mut self, event: &AnomalyEvent) -> Result<()> {
        self.events.push(JsonEvent {
            window_index: event.window_index(),
            timestamp_seconds: event.timestamp_secs(),
            speedup: event.label(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let summary = self.compute_summary();
        let result = JsonResultFile {
            source_file: self.source_file.clone(),
            analysis_date: Utc::now(),
            audio_duration_seconds: self.audio_duration,
            settings: JsonSettings {
                step: self.settings.step,
                window_width: self.settings.window_width,
                offset: self.settings.offset,
            },
            events: std::mem::take(&mut self.events),
            summary,
        };

        let file = File::create(&self.output_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &result).map_err(|e| Error::JsonWrite {
            path: self.output_path.clone(),
            source: e,
        })
    }
}
