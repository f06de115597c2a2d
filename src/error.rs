//! Error types for tapescan.

/// Result type alias for tapescan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for tapescan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A band or window falls outside the image, or a geometry parameter is degenerate.
    #[error("invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of the violated bound.
        message: String,
    },

    /// Spectrogram is narrower than a single scan window.
    #[error("spectrogram is too short to analyze: width {width}px < window width {window_width}px")]
    TooShort {
        /// Image width in pixels.
        width: u32,
        /// Requested window width in pixels.
        window_width: u32,
    },

    /// Nothing was found where at least one element was required.
    #[error("no {what} found")]
    EmptyInput {
        /// What was expected (e.g. "bands").
        what: &'static str,
    },

    /// The window classifier failed or timed out.
    #[error("classification failed at window {window_index}: {reason}")]
    Classification {
        /// Index of the window being classified.
        window_index: usize,
        /// Description of the failure.
        reason: String,
    },

    /// Scanning a spectrogram failed.
    #[error("failed to scan '{path}'")]
    ScanFailed {
        /// Path to the spectrogram.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<Self>,
    },

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// No valid spectrogram files found.
    #[error("no valid spectrogram images found in the provided paths")]
    NoValidInputFiles,

    /// Input and output directories are the same.
    #[error("input and output directory must differ: {path}")]
    SameInputOutput {
        /// The shared directory.
        path: std::path::PathBuf,
    },

    /// Failed to open or decode an image.
    #[error("failed to open image '{path}'")]
    ImageOpen {
        /// Path to the image file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to encode or save an image.
    #[error("failed to save image '{path}'")]
    ImageSave {
        /// Path to the image file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to read the duration of an audio file.
    #[error("failed to read audio duration from '{path}'")]
    AudioDuration {
        /// Path to the audio file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// No audio duration could be resolved for a spectrogram.
    #[error(
        "no audio duration for '{path}' (use --duration, --audio, or place a .wav next to the image)"
    )]
    DurationUnavailable {
        /// Path to the spectrogram.
        path: std::path::PathBuf,
    },

    /// Classification models are not configured.
    #[error("classification models not configured (set [models] in config or pass --binary-model/--speed-model)")]
    ModelsNotConfigured,

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to load a classification model.
    #[error("failed to load model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: std::path::PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Model inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write CSV output.
    #[error("failed to write CSV output '{path}'")]
    CsvWrite {
        /// Path to the CSV file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Build an [`Error::InvalidGeometry`] from a message.
    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Whether this is an expected data condition that should not stop a batch.
    ///
    /// `TooShort` and `EmptyInput` describe the input, not a fault.
    pub fn is_data_condition(&self) -> bool {
        match self {
            Self::TooShort { .. } | Self::EmptyInput { .. } => true,
            Self::ScanFailed { source, .. } => source.is_data_condition(),
            _ => false,
        }
    }

    /// Message followed by every underlying cause, joined by `: `.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_data_conditions() {
        assert!(
            Error::TooShort {
                width: 200,
                window_width: 256
            }
            .is_data_condition()
        );
        assert!(Error::EmptyInput { what: "bands" }.is_data_condition());
        assert!(!Error::geometry("out of bounds").is_data_condition());
    }

    #[test]
    fn test_scan_failed_inherits_data_condition() {
        let wrapped = Error::ScanFailed {
            path: PathBuf::from("spec.png"),
            source: Box::new(Error::TooShort {
                width: 10,
                window_width: 256,
            }),
        };
        assert!(wrapped.is_data_condition());

        let wrapped = Error::ScanFailed {
            path: PathBuf::from("spec.png"),
            source: Box::new(Error::Classification {
                window_index: 3,
                reason: "boom".to_string(),
            }),
        };
        assert!(!wrapped.is_data_condition());
    }

    #[test]
    fn test_report_walks_sources() {
        let wrapped = Error::ScanFailed {
            path: PathBuf::from("tape.png"),
            source: Box::new(Error::TooShort {
                width: 10,
                window_width: 256,
            }),
        };
        assert_eq!(
            wrapped.report(),
            "failed to scan 'tape.png': spectrogram is too short to analyze: width 10px < window width 256px"
        );
    }

    #[test]
    fn test_classification_message_includes_window() {
        let err = Error::Classification {
            window_index: 7,
            reason: "timed out after 5s".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "classification failed at window 7: timed out after 5s"
        );
    }
}
