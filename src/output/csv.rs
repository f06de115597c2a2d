//! CSV output format writer.

use crate::error::{Error, Result};
use crate::output::{AnomalyEvent, OutputWriter};
use std::fs::File;
use std::path::{Path, PathBuf};

/// CSV format output writer.
pub struct CsvWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvWriter {
    /// Create a new CSV writer.
    pub fn new(path: &Path) -> Result<Self> {
        let writer = csv::Writer::from_path(path).map_err(|e| Error::CsvWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    fn write_error(&self, source: csv::Error) -> Error {
        Error::CsvWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl OutputWriter for CsvWriter {
    fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_record(["window_index", "timestamp_s", "speedup"])
            .map_err(|e| self.write_error(e))
    }

    fn write_event(&mut self, event: &AnomalyEvent) -> Result<()> {
        self.writer
            .write_record([
                event.window_index().to_string(),
                format!("{:.2}", event.timestamp_secs()),
                event.label().to_string(),
            ])
            .map_err(|e| self.write_error(e))
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
