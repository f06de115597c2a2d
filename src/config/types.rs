//! Configuration type definitions.

use crate::constants::{bands, scan, segment};
use crate::vision::{BandParams, BandScanPolicy, BandSelection, WindowParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Band detection and divide settings.
    pub bands: BandsConfig,

    /// Live scan settings.
    pub scan: ScanConfig,

    /// Training-set segmentation settings.
    pub segment: SegmentConfig,

    /// Classification models.
    pub models: ModelsConfig,
}

/// Frequency scale a spectrogram was rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpectrogramScale {
    /// Logarithmic frequency axis.
    Log,
    /// Mel frequency axis.
    #[default]
    Mel,
    /// Linear frequency axis.
    Lin,
}

impl SpectrogramScale {
    /// Default dilation height for this scale.
    pub fn v_size(self) -> u32 {
        match self {
            Self::Log => bands::V_SIZE_LOG,
            Self::Mel => bands::V_SIZE_MEL,
            Self::Lin => bands::V_SIZE_LIN,
        }
    }
}

impl std::fmt::Display for SpectrogramScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Mel => write!(f, "mel"),
            Self::Lin => write!(f, "lin"),
        }
    }
}

/// Band detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandsConfig {
    /// Pixels below this value are treated as dark.
    pub low_threshold: u8,

    /// Value given to pixels at or above `low_threshold`.
    pub high_threshold: u8,

    /// Width of the dilation rectangle.
    pub h_size: u32,

    /// Height of the dilation rectangle; derived from `scale` when unset.
    pub v_size: Option<u32>,

    /// Spectrogram frequency scale.
    pub scale: SpectrogramScale,

    /// Row scanning policy.
    pub policy: BandScanPolicy,

    /// Which band to split at.
    pub selection: BandSelection,
}

impl Default for BandsConfig {
    fn default() -> Self {
        Self {
            low_threshold: bands::DEFAULT_LOW_THRESHOLD,
            high_threshold: bands::DEFAULT_HIGH_THRESHOLD,
            h_size: bands::DEFAULT_H_SIZE,
            v_size: None,
            scale: SpectrogramScale::default(),
            policy: BandScanPolicy::default(),
            selection: BandSelection::default(),
        }
    }
}

impl BandsConfig {
    /// Resolve detector parameters, deriving `v_size` from the scale if needed.
    pub fn params(&self) -> BandParams {
        BandParams {
            low_threshold: self.low_threshold,
            high_threshold: self.high_threshold,
            h_size: self.h_size,
            v_size: self.v_size.unwrap_or_else(|| self.scale.v_size()),
            policy: self.policy,
        }
    }
}

/// Live scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Stride between windows in pixels.
    pub step: u32,

    /// Window width in pixels.
    pub window_width: u32,

    /// Offset of the first window in pixels.
    pub offset: u32,

    /// Per-call classifier timeout in seconds; 0 disables it.
    pub classifier_timeout_secs: u64,

    /// Output formats written per spectrogram.
    pub formats: Vec<OutputFormat>,

    /// Number of spectrograms scanned concurrently.
    pub jobs: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step: scan::DEFAULT_STEP,
            window_width: scan::DEFAULT_WINDOW_WIDTH,
            offset: scan::DEFAULT_OFFSET,
            classifier_timeout_secs: scan::DEFAULT_CLASSIFIER_TIMEOUT_SECS,
            formats: vec![OutputFormat::Log],
            jobs: scan::DEFAULT_JOBS,
        }
    }
}

impl ScanConfig {
    /// Window geometry for scanning.
    pub fn window_params(&self) -> WindowParams {
        WindowParams {
            step: self.step,
            window_width: self.window_width,
            offset: self.offset,
        }
    }
}

/// Training-set segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Stride between windows in pixels.
    pub step: u32,

    /// Window width in pixels.
    pub window_width: u32,

    /// Offset of the first window in pixels.
    pub offset: u32,

    /// Emit every window instead of only the one at `offset`.
    pub all_windows: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            step: segment::DEFAULT_STEP,
            window_width: segment::DEFAULT_WINDOW_WIDTH,
            offset: 0,
            all_windows: true,
        }
    }
}

impl SegmentConfig {
    /// Window geometry for segmentation.
    pub fn window_params(&self) -> WindowParams {
        WindowParams {
            step: self.step,
            window_width: self.window_width,
            offset: self.offset,
        }
    }
}

/// Tensor layout expected by the classification models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// `[1, height, width]`.
    #[default]
    Nhw,
    /// `[1, height, width, 1]`.
    Nhwc,
}

impl std::fmt::Display for InputLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nhw => write!(f, "nhw"),
            Self::Nhwc => write!(f, "nhwc"),
        }
    }
}

/// Classification model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Path to the binary anomaly model.
    pub binary: Option<PathBuf>,

    /// Path to the four-class speed model.
    pub speed: Option<PathBuf>,

    /// Tensor layout of the model input.
    pub input_layout: InputLayout,

    /// Factor applied to every pixel before inference.
    pub input_scale: f32,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            binary: None,
            speed: None,
            input_layout: InputLayout::default(),
            input_scale: 1.0,
        }
    }
}

/// Supported event output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain-text event log.
    Log,
    /// CSV table.
    Csv,
    /// JSON document.
    Json,
}

impl OutputFormat {
    /// File extension appended to the spectrogram stem.
    pub fn extension(self) -> &'static str {
        use crate::constants::output_extensions;
        match self {
            Self::Log => output_extensions::LOG,
            Self::Csv => output_extensions::CSV,
            Self::Json => output_extensions::JSON,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "txt" => Ok(Self::Log),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("log".parse::<OutputFormat>().ok(), Some(OutputFormat::Log));
        assert_eq!("txt".parse::<OutputFormat>().ok(), Some(OutputFormat::Log));
        assert_eq!("CSV".parse::<OutputFormat>().ok(), Some(OutputFormat::Csv));
        assert_eq!("json".parse::<OutputFormat>().ok(), Some(OutputFormat::Json));
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Log.extension(), ".events.txt");
        assert_eq!(OutputFormat::Csv.extension(), ".events.csv");
        assert_eq!(OutputFormat::Json.extension(), ".events.json");
    }

    #[test]
    fn test_v_size_follows_scale() {
        let mut bands = BandsConfig::default();
        assert_eq!(bands.params().v_size, 20);

        bands.scale = SpectrogramScale::Log;
        assert_eq!(bands.params().v_size, 10);

        bands.v_size = Some(7);
        assert_eq!(bands.params().v_size, 7);
    }

    #[test]
    fn test_scan_defaults() {
        let scan = ScanConfig::default();
        assert_eq!(scan.window_params().step, 32);
        assert_eq!(scan.window_params().window_width, 256);
        assert_eq!(scan.formats, vec![OutputFormat::Log]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[bands]
scale = "log"
policy = "full-row"

[models]
input_layout = "nhwc"
"#,
        )
        .unwrap();
        assert_eq!(config.bands.scale, SpectrogramScale::Log);
        assert_eq!(config.bands.policy, BandScanPolicy::FullRow);
        assert_eq!(config.bands.low_threshold, 15);
        assert_eq!(config.models.input_layout, InputLayout::Nhwc);
        assert_eq!(config.segment.step, 64);
    }
}
