//! Plain-text event log writer.

use crate::error::Result;
use crate::output::{AnomalyEvent, OutputWriter, format_seconds};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the `Filename:` / `Duration:` / `Segment ...` event log.
pub struct EventLogWriter {
    writer: BufWriter<File>,
    source: String,
    duration_secs: f64,
}

impl EventLogWriter {
    /// Create a log at `path` for the spectrogram named `source`.
    pub fn new(path: &Path, source: &str, duration_secs: f64) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            source: source.to_string(),
            duration_secs,
        })
    }
}

impl OutputWriter for EventLogWriter {
    fn write_header(&mut self) -> Result<()> {
        writeln!(self.writer, "Filename: {}", self.source)?;
        writeln!(self.writer, "Duration: {}s", format_seconds(self.duration_secs))?;
        Ok(())
    }

    fn write_event(&mut self, event: &AnomalyEvent) -> Result<()> {
        writeln!(self.writer, "{event}")?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::inference::SpeedChange;
    use tempfile::NamedTempFile;

    #[test]
    fn test_event_log_layout() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EventLogWriter::new(file.path(), "tape_ch0.png", 240.0).unwrap();

        writer.write_header().unwrap();
        writer
            .write_event(&AnomalyEvent::new(8, 60.0, SpeedChange::Double))
            .unwrap();
        writer
            .write_event(&AnomalyEvent::new(9, 67.68, SpeedChange::Quarter))
            .unwrap();
        writer.finalize().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "Filename: tape_ch0.png\n\
             Duration: 240.0s\n\
             Segment 8, time: 60.0s, speedup: double\n\
             Segment 9, time: 67.68s, speedup: quarter\n"
        );
    }
}
