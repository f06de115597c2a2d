//! Scan result types and output format writers.

mod csv;
mod json;
mod log;
pub mod progress;
mod types;
mod writer;

pub use csv::CsvWriter;
pub use json::{JsonEvent, JsonResultFile, JsonResultWriter, JsonSettings, JsonSummary};
pub use log::EventLogWriter;
pub use types::{AnomalyEvent, format_seconds, round_seconds};
pub use writer::OutputWriter;
