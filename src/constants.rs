//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "tapescan";

/// Band detection defaults.
pub mod bands {
    /// Pixels darker than this are cut to zero before dilation.
    pub const DEFAULT_LOW_THRESHOLD: u8 = 15;

    /// Value assigned to pixels at or above the low threshold.
    pub const DEFAULT_HIGH_THRESHOLD: u8 = 255;

    /// Width of the dilation rectangle.
    pub const DEFAULT_H_SIZE: u32 = 3;

    /// Height of the dilation rectangle for log-frequency spectrograms.
    ///
    /// Log spectrograms spread low frequencies over more rows, so a shorter
    /// kernel already bridges the gaps in a transition edge.
    pub const V_SIZE_LOG: u32 = 10;

    /// Height of the dilation rectangle for mel spectrograms.
    pub const V_SIZE_MEL: u32 = 20;

    /// Height of the dilation rectangle for linear spectrograms.
    pub const V_SIZE_LIN: u32 = 20;
}

/// Live scan defaults.
pub mod scan {
    /// Horizontal stride between windows in pixels.
    pub const DEFAULT_STEP: u32 = 32;

    /// Window width in pixels.
    pub const DEFAULT_WINDOW_WIDTH: u32 = 256;

    /// Offset of the first window in pixels.
    pub const DEFAULT_OFFSET: u32 = 0;

    /// Per-call classifier timeout in seconds (0 disables the timeout).
    pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

    /// Number of spectrograms scanned concurrently.
    pub const DEFAULT_JOBS: usize = 1;

    /// Decimal places kept in event timestamps.
    pub const TIMESTAMP_DECIMALS: i32 = 2;
}

/// Training-set segmentation defaults.
pub mod segment {
    /// Horizontal stride between windows in pixels.
    pub const DEFAULT_STEP: u32 = 64;

    /// Window width in pixels.
    pub const DEFAULT_WINDOW_WIDTH: u32 = 256;
}

/// Naming conventions for persisted images.
pub mod naming {
    /// Prefix for the half before a speed transition.
    pub const BEFORE_PREFIX: &str = "c_";

    /// Prefix for the half after a speed transition.
    pub const AFTER_PREFIX: &str = "w_";

    /// Subdirectory for halves before a speed transition.
    pub const BEFORE_DIR: &str = "c";

    /// Subdirectory for halves after a speed transition.
    pub const AFTER_DIR: &str = "w";

    /// Suffix of the directory holding window images saved during a scan.
    pub const WINDOWS_DIR_SUFFIX: &str = "_windows";

    /// Extension of written images.
    pub const IMAGE_EXTENSION: &str = "png";
}

/// Output file extensions by format.
pub mod output_extensions {
    /// Plain-text event log extension.
    pub const LOG: &str = ".events.txt";
    /// CSV output extension.
    pub const CSV: &str = ".events.csv";
    /// JSON output extension.
    pub const JSON: &str = ".events.json";
}

/// Input file extensions accepted as spectrogram images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png"];

/// Audio file extension looked up next to a spectrogram for its duration.
pub const AUDIO_SIDECAR_EXTENSION: &str = "wav";
